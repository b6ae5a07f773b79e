// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;
use time::macros::format_description;

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub client: String,
    pub project: String,
    pub domain: String,
    #[serde(deserialize_with = "deserialize_rate")]
    pub rate: f64,
    pub starting_date: String,
    pub ending_date: String,
}

/// A project that the server has not assigned an id to yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub client: String,
    pub project: String,
    pub domain: String,
    #[serde(deserialize_with = "deserialize_rate")]
    pub rate: f64,
    pub starting_date: String,
    pub ending_date: String,
}

impl ProjectDraft {
    pub fn with_id(self, id: ProjectId) -> Project {
        Project {
            id,
            client: self.client,
            project: self.project,
            domain: self.domain,
            rate: self.rate,
            starting_date: self.starting_date,
            ending_date: self.ending_date,
        }
    }
}

impl Project {
    pub fn field(&self, key: SortKey) -> String {
        match key {
            SortKey::Id => self.id.to_string(),
            SortKey::Client => self.client.clone(),
            SortKey::Project => self.project.clone(),
            SortKey::Domain => self.domain.clone(),
            SortKey::Rate => format_rate(self.rate),
            SortKey::StartingDate => self.starting_date.clone(),
            SortKey::EndingDate => self.ending_date.clone(),
        }
    }
}

// Some backends store the rate as a string; accept both.
fn deserialize_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRate {
        Number(f64),
        Text(String),
    }

    match RawRate::deserialize(deserializer)? {
        RawRate::Number(value) => Ok(value),
        RawRate::Text(text) if text.trim().is_empty() => Ok(0.0),
        RawRate::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid rate {text:?}"))),
    }
}

pub fn format_rate(rate: f64) -> String {
    format!("{rate}")
}

/// Parses the two date shapes the backend is known to hand out.
pub fn parse_display_date(value: &str) -> Option<Date> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(value, format_description!("[day]/[month]/[year]")))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    Id,
    Client,
    Project,
    Domain,
    Rate,
    StartingDate,
    EndingDate,
}

impl SortKey {
    pub const ALL: [Self; 7] = [
        Self::Id,
        Self::Client,
        Self::Project,
        Self::Domain,
        Self::Rate,
        Self::StartingDate,
        Self::EndingDate,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Client => "client",
            Self::Project => "project",
            Self::Domain => "domain",
            Self::Rate => "rate",
            Self::StartingDate => "starting_date",
            Self::EndingDate => "ending_date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "client" => Some(Self::Client),
            "project" => Some(Self::Project),
            "domain" => Some(Self::Domain),
            "rate" => Some(Self::Rate),
            "starting_date" => Some(Self::StartingDate),
            "ending_date" => Some(Self::EndingDate),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Client => "client",
            Self::Project => "project",
            Self::Domain => "domain",
            Self::Rate => "rate / month",
            Self::StartingDate => "start",
            Self::EndingDate => "end",
        }
    }

    pub const fn is_date(self) -> bool {
        matches!(self, Self::StartingDate | Self::EndingDate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    /// Same key flips the direction, any other key starts ascending.
    pub fn toggle(current: Option<Self>, key: SortKey) -> Self {
        match current {
            Some(spec) if spec.key == key => Self {
                key,
                direction: spec.direction.flipped(),
            },
            _ => Self::ascending(key),
        }
    }
}

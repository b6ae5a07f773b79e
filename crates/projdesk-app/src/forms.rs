// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Project, ProjectDraft, ProjectId, format_rate, parse_display_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Client,
    Project,
    Domain,
    Rate,
    StartingDate,
    EndingDate,
}

impl FormField {
    pub const ALL: [Self; 6] = [
        Self::Client,
        Self::Project,
        Self::Domain,
        Self::Rate,
        Self::StartingDate,
        Self::EndingDate,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Project => "project",
            Self::Domain => "domain",
            Self::Rate => "rate / month",
            Self::StartingDate => "start date",
            Self::EndingDate => "end date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ProjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    Create(ProjectDraft),
    Update(Project),
}

/// Text buffers for the create/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectForm {
    pub mode: FormMode,
    pub client: String,
    pub project: String,
    pub domain: String,
    pub rate: String,
    pub starting_date: String,
    pub ending_date: String,
    pub focus: usize,
}

impl ProjectForm {
    pub fn blank() -> Self {
        Self {
            mode: FormMode::Create,
            client: String::new(),
            project: String::new(),
            domain: String::new(),
            rate: String::new(),
            starting_date: String::new(),
            ending_date: String::new(),
            focus: 0,
        }
    }

    pub fn for_project(project: &Project) -> Self {
        Self {
            mode: FormMode::Edit(project.id),
            client: project.client.clone(),
            project: project.project.clone(),
            domain: project.domain.clone(),
            rate: format_rate(project.rate),
            starting_date: project.starting_date.clone(),
            ending_date: project.ending_date.clone(),
            focus: 0,
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Create => "new project".to_owned(),
            FormMode::Edit(id) => format!("edit project {id}"),
        }
    }

    pub fn focused_field(&self) -> FormField {
        FormField::ALL[self.focus % FormField::ALL.len()]
    }

    pub fn move_focus(&mut self, delta: isize) {
        let len = FormField::ALL.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Client => &self.client,
            FormField::Project => &self.project,
            FormField::Domain => &self.domain,
            FormField::Rate => &self.rate,
            FormField::StartingDate => &self.starting_date,
            FormField::EndingDate => &self.ending_date,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Client => &mut self.client,
            FormField::Project => &mut self.project,
            FormField::Domain => &mut self.domain,
            FormField::Rate => &mut self.rate,
            FormField::StartingDate => &mut self.starting_date,
            FormField::EndingDate => &mut self.ending_date,
        }
    }

    pub fn push_char(&mut self, ch: char) {
        let field = self.focused_field();
        self.value_mut(field).push(ch);
    }

    pub fn pop_char(&mut self) {
        let field = self.focused_field();
        self.value_mut(field).pop();
    }

    pub fn set_value(&mut self, field: FormField, value: &str) {
        *self.value_mut(field) = value.to_owned();
    }

    pub fn validate(&self) -> Result<()> {
        self.parse_rate()?;
        if self.client.trim().is_empty() {
            bail!("client is required -- enter a client name and retry");
        }
        if self.project.trim().is_empty() {
            bail!("project name is required -- enter a name and retry");
        }
        if let (Some(start), Some(end)) = (
            parse_display_date(&self.starting_date),
            parse_display_date(&self.ending_date),
        ) && end < start
        {
            bail!("end date must be on/after start date");
        }
        Ok(())
    }

    fn parse_rate(&self) -> Result<f64> {
        let raw = self.rate.trim();
        if raw.is_empty() {
            return Ok(0.0);
        }
        let Ok(rate) = raw.parse::<f64>() else {
            bail!("rate {raw:?} is not a number -- use digits like 450 or 450.5");
        };
        if !rate.is_finite() {
            bail!("rate must be a finite number -- use digits like 450 or 450.5");
        }
        if rate < 0.0 {
            bail!("rate cannot be negative");
        }
        Ok(rate)
    }

    pub fn submit(&self) -> Result<FormSubmission> {
        self.validate()?;
        let draft = ProjectDraft {
            client: self.client.trim().to_owned(),
            project: self.project.trim().to_owned(),
            domain: self.domain.trim().to_owned(),
            rate: self.parse_rate()?,
            starting_date: self.starting_date.trim().to_owned(),
            ending_date: self.ending_date.trim().to_owned(),
        };
        Ok(match self.mode {
            FormMode::Create => FormSubmission::Create(draft),
            FormMode::Edit(id) => FormSubmission::Update(draft.with_id(id)),
        })
    }
}

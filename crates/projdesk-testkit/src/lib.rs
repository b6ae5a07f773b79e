// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use projdesk_app::{Project, ProjectDraft, ProjectId};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Duration};

const CLIENTS: [&str; 14] = [
    "Acme",
    "Borealis",
    "Zenith Bank",
    "Northwind",
    "Globex",
    "Initech",
    "Umbrella Health",
    "Stark Logistics",
    "Wayne Energy",
    "Hooli",
    "Vandelay Imports",
    "Cyberdyne",
    "Soylent Foods",
    "Tyrell Mobility",
];

const PROJECT_NAMES: [&str; 16] = [
    "Portal",
    "Billing",
    "Ledger",
    "Mobile app",
    "Data platform",
    "Checkout",
    "Design system",
    "Claims engine",
    "Fleet tracker",
    "Onboarding",
    "Search",
    "Reporting",
    "Pricing API",
    "Migration",
    "Intranet",
    "Scheduling",
];

const DOMAINS: [&str; 10] = [
    "Banking",
    "Retail",
    "Energy",
    "Insurance",
    "Logistics",
    "Healthcare",
    "Telecom",
    "Media",
    "Public sector",
    "Automotive",
];

const EARLIEST_START: Date = date!(2019-01-01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for plausible project records.
#[derive(Debug, Clone)]
pub struct ProjectFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ProjectFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn draft(&mut self) -> ProjectDraft {
        let start = EARLIEST_START + Duration::days(self.int_range_i64(0, 6 * 365));
        // A quarter of the projects are still running.
        let ending_date = if self.rng.int_n(4) == 0 {
            String::new()
        } else {
            display_date(start + Duration::days(self.int_range_i64(30, 540)))
        };

        ProjectDraft {
            client: self.pick(&CLIENTS).to_owned(),
            project: self.pick(&PROJECT_NAMES).to_owned(),
            domain: self.pick(&DOMAINS).to_owned(),
            rate: (self.int_range_i64(30, 95) * 10) as f64,
            starting_date: display_date(start),
            ending_date,
        }
    }

    pub fn project(&mut self, id: i64) -> Project {
        self.draft().with_id(ProjectId::new(id))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

/// `count` records with ids `1..=count`.
pub fn demo_projects(seed: u64, count: usize) -> Vec<Project> {
    let mut faker = ProjectFaker::new(seed);
    (1..=count as i64).map(|id| faker.project(id)).collect()
}

/// The four-record set used across the table tests.
pub fn fixture_projects() -> Vec<Project> {
    let record = |id: i64, client: &str, project: &str, domain: &str, rate: f64, start: &str| {
        Project {
            id: ProjectId::new(id),
            client: client.to_owned(),
            project: project.to_owned(),
            domain: domain.to_owned(),
            rate,
            starting_date: start.to_owned(),
            ending_date: String::new(),
        }
    };
    vec![
        record(1, "Zenith", "Ledger", "Banking", 600.0, "15/03/2021"),
        record(2, "acme", "Portal", "Retail", 450.0, "02/11/2020"),
        record(3, "Borealis", "Billing", "Energy", 600.0, "01/01/2022"),
        record(4, "Acme", "Mobile app", "Retail", 520.0, "30/06/2020"),
    ]
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let config_path = dir.path().join("config.toml");
    Ok((dir, config_path))
}

fn display_date(date: Date) -> String {
    format!(
        "{:02}/{:02}/{}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

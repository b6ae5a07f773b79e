// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_TARGETS: [&str; 3] = ["projdesk", "projdesk_api", "projdesk_tui"];

fn default_filter(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Routes tracing output to `file`; the terminal belongs to the UI.
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, file: &Path) -> Result<()> {
    if let Some(dir) = file.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                file.display()
            )
        })?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false),
    );

    // Already installed when called twice in one process.
    let _ = subscriber.try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{default_filter, init_logging};
    use anyhow::Result;

    #[test]
    fn default_filter_covers_every_logging_crate() {
        assert_eq!(
            default_filter("debug"),
            "projdesk=debug,projdesk_api=debug,projdesk_tui=debug"
        );
    }

    #[test]
    fn init_creates_the_log_file_and_parent_dirs() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("projdesk.log");
        init_logging("info", &path)?;
        assert!(path.exists());
        Ok(())
    }
}

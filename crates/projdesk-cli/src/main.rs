// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use projdesk_api::Client;
use projdesk_app::ProjectTable;
use projdesk_tui::UiOptions;
use runtime::{ApiRuntime, DemoRuntime};
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `projdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_file = config.log_file()?;
    logging::init_logging(&config.log_level(), &log_file)?;
    info!(
        config = %options.config_path.display(),
        demo = options.demo,
        "starting projdesk"
    );

    let ui_options = UiOptions {
        status_clear: config.status_clear()?,
    };
    let mut table = ProjectTable::with_sort(config.initial_sort());

    if options.demo {
        if options.check_only {
            println!("config ok; demo mode skips the API check");
            return Ok(());
        }
        let mut runtime = DemoRuntime::seeded();
        return projdesk_tui::run_app(&mut table, &mut runtime, ui_options);
    }

    let client = Client::new(config.api_base_url(), config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        client.ping()?;
        println!("config ok; reached {}", client.base_url());
        return Ok(());
    }

    let mut runtime = ApiRuntime::new(client);
    projdesk_tui::run_app(&mut table, &mut runtime, ui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("projdesk - manage project records over the projects API");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch against an in-memory backend with generated projects");
    println!("  --check                  Validate config and reach the API, then exit");
    println!("  --help                   Show this help");
}

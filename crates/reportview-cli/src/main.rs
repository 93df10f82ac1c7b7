// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod host;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use host::{Clipboard, HostCommand};
use reportview_app::ViewState;
use reportview_fetch::Client;
use reportview_tui::ViewerOptions;
use runtime::HostRuntime;
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

    let mut config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `reportview --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    if let Some(base_url) = &options.base_url {
        config.set_base_url_override(base_url)?;
    }

    let client = Client::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [source] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        let reports = client.fetch_index()?;
        println!("{} reports at {}", reports.len(), client.index_url()?);
        return Ok(());
    }

    logging::init(config.log_level(), &config.log_file()?)?;
    info!(
        base_url = %client.base_url(),
        stale_policy = config.stale_policy().as_str(),
        "starting viewer"
    );

    let clipboard = Clipboard::from_config(config.clipboard_command())?;
    info!(clipboard = %clipboard.describe(), "clipboard target");
    let print = HostCommand::parse(config.print_command()).context("invalid [host].print_command")?;

    let mut state = ViewState::with_policy(config.stale_policy());
    let mut runtime = HostRuntime::new(client, clipboard, print);
    reportview_tui::run_app(
        &mut state,
        &mut runtime,
        ViewerOptions {
            copied_reset: config.copied_reset()?,
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    base_url: Option<String>,
    print_config_path: bool,
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
        base_url: None,
        print_config_path: false,
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
            "--base-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--base-url requires a URL"))?;
                options.base_url = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
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
    println!("reportview");
    println!("  --config <path>          Use a specific config path");
    println!("  --base-url <url>         Override [source].base_url");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and fetch the report index");
    println!("  --help                   Show this help");
}

//! flowsense - household water leak checks and bill analysis
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use flowsense::cli::{Cli, Commands};
use flowsense::core::logging::{self, LogSettings};
use flowsense::storage::{Config, ResolvedConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_settings = LogSettings::resolve(cli.log_level.as_deref(), cli.json_output, cli.verbose);
    logging::init(&log_settings);

    let format = cli.effective_format();
    let no_color = !flowsense::util::env::should_use_color(cli.no_color);
    let pretty = cli.pretty;

    let config = match ResolvedConfig::resolve(&cli) {
        Ok(mut config) => {
            config.no_color = config.no_color || no_color;
            config
        }
        Err(e) if matches!(cli.command, Some(Commands::Doctor)) => {
            let config_path = Config::locate(|key| std::env::var(key).ok());
            return match flowsense::cli::doctor::execute_config_failure(
                &config_path,
                &e,
                format,
                pretty,
                no_color,
            ) {
                Ok(_) => ExitCode::FAILURE,
                Err(render_err) => report_error(&render_err, format, no_color, pretty),
            };
        }
        Err(e) => return report_error(&e, format, no_color, pretty),
    };

    match run(cli, &config).await {
        Ok(code) => code,
        Err(e) => report_error(&e, config.format, config.no_color, config.pretty),
    }
}

async fn run(cli: Cli, config: &ResolvedConfig) -> flowsense::Result<ExitCode> {
    match cli.command {
        None => {
            print_quickstart();
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Leak(cmd)) => {
            flowsense::cli::leak::execute(&cmd, config)?;
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Bill(cmd)) => {
            flowsense::cli::bill::execute(&cmd, config).await?;
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Status) => {
            flowsense::cli::status::execute(config)?;
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Doctor) => {
            let healthy = flowsense::cli::doctor::execute(config).await?;
            Ok(if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn report_error(
    error: &flowsense::FlowError,
    format: flowsense::cli::OutputFormat,
    no_color: bool,
    pretty: bool,
) -> ExitCode {
    tracing::debug!(error_code = error.error_code(), "{error}");
    let output = flowsense::render::error::render_error(error, format, no_color, pretty);
    eprintln!("{}", output.trim_end_matches('\n'));
    ExitCode::from(u8::from(error.exit_code()))
}

/// Print quickstart help when no command is given.
fn print_quickstart() {
    println!(
        r"flowsense - household water leak checks and bill analysis

USAGE:
    flowsense [OPTIONS] <COMMAND>

COMMANDS:
    leak     Record and inspect leak checks
    bill     Scan, record, and inspect water bills
    status   Show the household guardian status
    doctor   Diagnose configuration, storage, and extraction setup

QUICK START:
    flowsense leak check --reading-a 1024.5 --reading-b 1024.9 --no-water-used
    flowsense bill scan ./bill.jpg
    flowsense status
    flowsense doctor

ROBOT MODE (for scripts and agents):
    flowsense status --json       # JSON output
    flowsense leak list --format md

For more help: flowsense --help
"
    );
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use teo_logs::config::{Args, Config, CredentialPaths, DEFAULT_UTC_OFFSET_HOURS};

/// Exports one day of EdgeOne L7 access logs into `<YYYYMMDD>-<zone>.xz`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Day to export (YYYY-MM-DD). Defaults to two days ago.
    date: Option<String>,

    /// Export every day from DATE up to, not including, this one.
    #[arg(long, value_name = "DATE")]
    end_date: Option<String>,

    /// Hours east of UTC defining the day boundaries.
    #[arg(long, default_value_t = DEFAULT_UTC_OFFSET_HOURS, allow_hyphen_values = true)]
    utc_offset: i32,

    #[arg(long, default_value = "sid")]
    secret_id_file: PathBuf,

    #[arg(long, default_value = "sk")]
    secret_key_file: PathBuf,

    #[arg(long, default_value = "zid")]
    zone_id_file: PathBuf,

    /// Directory receiving the archives.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn init_logging() {
    let log_level = env::var("TEO_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    debug!("Logging subsystem enabled");

    let paths = CredentialPaths {
        secret_id: cli.secret_id_file,
        secret_key: cli.secret_key_file,
        zone_id: cli.zone_id_file,
    };
    let args = Args {
        date: cli.date,
        end_date: cli.end_date,
        utc_offset_hours: Some(cli.utc_offset),
        output_dir: Some(cli.output_dir),
    };
    let today = chrono::Local::now().date_naive();

    let config = match Config::load(&paths, &args, today) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Exporting zone {} starting {}",
        config.zone_id, config.date
    );

    match teo_logs::run(&config).await {
        Ok(written) => {
            for path in written {
                info!("<- {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Export failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["teo-logsave"]);
        assert_eq!(cli.date, None);
        assert_eq!(cli.utc_offset, 8);
        assert_eq!(cli.secret_id_file, PathBuf::from("sid"));
        assert_eq!(cli.secret_key_file, PathBuf::from("sk"));
        assert_eq!(cli.zone_id_file, PathBuf::from("zid"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_cli_explicit_values() {
        let cli = Cli::parse_from([
            "teo-logsave",
            "2024-03-01",
            "--end-date",
            "2024-03-04",
            "--utc-offset",
            "-5",
            "--output-dir",
            "/tmp/logs",
        ]);
        assert_eq!(cli.date.as_deref(), Some("2024-03-01"));
        assert_eq!(cli.end_date.as_deref(), Some("2024-03-04"));
        assert_eq!(cli.utc_offset, -5);
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/logs"));
    }
}

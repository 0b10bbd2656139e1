use std::process::ExitCode;

use clap::Parser;

use crate::cache::{CacheStore, Coordinator};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::AppError;
use crate::monitor::Discovery;
use crate::protocols::i2c_dev::DevI2c;

#[macro_use]
extern crate tracing;

mod brightness;
mod cache;
mod cli;
mod config;
mod error;
#[cfg(feature = "hyprland")]
mod hyprland;
mod monitor;
mod permissions;
mod protocols;

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=warn",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Exit code 2 is reserved for lock contention.
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    setup_logs();

    let config_path = Config::path();
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            error!("errors loading config: {:?}", err);
            Config::default()
        }
    };

    match run(&cli, &config) {
        Ok(value) => {
            debug!("Brightness set to {}", value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli, config: &Config) -> error::Result<u8> {
    let monitor = match &cli.monitor {
        Some(name) => name.clone(),
        None => active_monitor()?,
    };

    std::fs::create_dir_all(&config.cache_dir)
        .map_err(|e| AppError::cache(&config.cache_dir, e))?;

    let store = CacheStore::new(&config.cache_dir);
    let discovery = Discovery::from_config(config);
    let request = cli.request(&config.gradual);

    let result = Coordinator::new(&store, &discovery, &DevI2c).run(&monitor, &request);
    if let Err(AppError::Discovery { .. }) = &result {
        permissions::log_access_hints(&discovery);
    }
    result
}

#[cfg(feature = "hyprland")]
fn active_monitor() -> error::Result<String> {
    let name = hyprland::active_monitor().map_err(|source| AppError::ActiveMonitor { source })?;
    cli::validate_monitor_name(&name).map_err(AppError::Argument)?;
    Ok(name)
}

#[cfg(not(feature = "hyprland"))]
fn active_monitor() -> error::Result<String> {
    Err(AppError::Argument(
        "no monitor given; pass -m <NAME>".to_string(),
    ))
}

// SPDX-License-Identifier: GPL-3.0-only
//! Command line interface

use std::time::Duration;

use clap::Parser;

use crate::brightness::{Adjustment, BrightnessRequest, Ramp, Strategy};
use crate::config::GradualConfig;

/// Largest absolute value or relative change accepted on the command line
const MAX_PERCENT: u8 = 100;

/// Set external monitor brightness over DDC/CI.
#[derive(Parser, Debug)]
#[command(name = "ddcbright", version, about)]
pub struct Cli {
    /// Brightness: N sets 0-100, +N raises by N, -N lowers by N.
    #[arg(value_name = "VALUE", allow_negative_numbers = true, value_parser = parse_adjustment)]
    pub value: Adjustment,

    /// Monitor connector name (e.g. DP-1) instead of the active monitor.
    #[arg(short, long, value_name = "NAME", value_parser = parse_monitor_name)]
    pub monitor: Option<String>,

    /// Change gradually, with optional step size (default 2) and pause
    /// between steps in milliseconds (default 0).
    #[arg(
        short = 'a',
        long = "gradual",
        num_args = 0..=2,
        value_names = ["STEP", "SLEEP_MS"],
        allow_negative_numbers = true
    )]
    pub gradual: Option<Vec<i64>>,
}

impl Cli {
    /// How the change should be applied; `defaults` fill in what `-a` omits
    pub fn strategy(&self, defaults: &GradualConfig) -> Strategy {
        let Some(values) = &self.gradual else {
            return Strategy::Direct;
        };

        let step = match values.first() {
            Some(&step) if (1..=i64::from(MAX_PERCENT)).contains(&step) => step as u8,
            _ => defaults.step,
        };
        let sleep_ms = match values.get(1) {
            Some(&ms) => ms.max(0) as u64,
            None => defaults.sleep_ms,
        };

        Strategy::Gradual(Ramp {
            step,
            pause: Duration::from_millis(sleep_ms),
        })
    }

    pub fn request(&self, defaults: &GradualConfig) -> BrightnessRequest {
        BrightnessRequest {
            adjustment: self.value,
            strategy: self.strategy(defaults),
        }
    }
}

fn parse_percent(digits: &str, arg: &str) -> Result<i32, String> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("expected N, +N or -N, got {arg:?}"));
    }
    match digits.parse::<u8>() {
        Ok(value) if value <= MAX_PERCENT => Ok(i32::from(value)),
        _ => Err(format!("{arg} is outside 0-{MAX_PERCENT}")),
    }
}

/// `N` -> absolute, `+N` / `-N` -> relative
pub fn parse_adjustment(arg: &str) -> Result<Adjustment, String> {
    if let Some(digits) = arg.strip_prefix('+') {
        return parse_percent(digits, arg).map(Adjustment::Relative);
    }
    if let Some(digits) = arg.strip_prefix('-') {
        return parse_percent(digits, arg).map(|delta| Adjustment::Relative(-delta));
    }
    parse_percent(arg, arg).map(Adjustment::Absolute)
}

/// Monitor names end up as file names and as a cache field
pub fn validate_monitor_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(format!("invalid monitor name {name:?}"));
    }
    if name.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(format!(
            "monitor name {name:?} must not contain whitespace or '/'"
        ));
    }
    Ok(())
}

fn parse_monitor_name(arg: &str) -> Result<String, String> {
    validate_monitor_name(arg)?;
    Ok(arg.to_string())
}

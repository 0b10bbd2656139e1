// SPDX-License-Identifier: GPL-3.0-only
//! Brightness calculation and application
//!
//! Computes the target from an absolute or relative request and drives the
//! display there, either in one write or as a ramp of intermediate values.

use std::io;
use std::time::Duration;

use crate::protocols::BrightnessControl;
use crate::protocols::ddc_ci::MAX_BRIGHTNESS;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Set to this value
    Absolute(i32),
    /// Move by this many points from the current value
    Relative(i32),
}

impl Adjustment {
    /// Target brightness, always within 0-100
    pub fn target(self, current: u8) -> u8 {
        let wanted = match self {
            Adjustment::Absolute(value) => i64::from(value),
            Adjustment::Relative(delta) => i64::from(current) + i64::from(delta),
        };
        // Clamped to 0..=100, so the narrowing cannot truncate.
        wanted.clamp(0, i64::from(MAX_BRIGHTNESS)) as u8
    }
}

/// Step size and pause for a gradual change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    pub step: u8,
    pub pause: Duration,
}

/// How a change reaches the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Gradual(Ramp),
}

/// One brightness change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessRequest {
    pub adjustment: Adjustment,
    pub strategy: Strategy,
}

/// Values written on the way from `current` to `target`.
///
/// Each value moves `step` towards the target and the last one is cut short
/// so the target is never overshot. A distance of at most one step is a
/// single write of `target`.
pub fn ramp_values(current: u8, target: u8, step: u8) -> Vec<u8> {
    let step = i16::from(step.max(1));
    let (current, target) = (i16::from(current), i16::from(target));

    if (target - current).abs() <= step {
        return vec![target as u8];
    }

    let direction = (target - current).signum();
    let mut values = Vec::new();
    let mut value = current;
    while value != target {
        value += step * direction;
        if (direction > 0 && value > target) || (direction < 0 && value < target) {
            value = target;
        }
        // Always between current and target, both of which are u8.
        values.push(value as u8);
    }
    values
}

/// Applies a [`Strategy`] to a display
#[derive(Debug, Clone, Copy)]
pub struct BrightnessController {
    strategy: Strategy,
}

impl BrightnessController {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// Drive `display` from `current` to `target`.
    ///
    /// The first failed write aborts; the display keeps whatever value was
    /// last applied.
    pub fn apply<D: BrightnessControl>(
        &self,
        display: &mut D,
        current: u8,
        target: u8,
    ) -> io::Result<()> {
        let ramp = match self.strategy {
            Strategy::Direct => {
                debug!(value = target, "Setting brightness");
                return display.set_brightness(target);
            }
            Strategy::Gradual(ramp) => ramp,
        };

        let values = ramp_values(current, target, ramp.step);
        debug!(from = current, to = target, steps = values.len(), "Ramping brightness");

        for (i, &value) in values.iter().enumerate() {
            if i > 0 && !ramp.pause.is_zero() {
                std::thread::sleep(ramp.pause);
            }
            if let Err(e) = display.set_brightness(value) {
                warn!("Failed to set brightness at step {}: {}", value, e);
                return Err(e);
            }
        }
        Ok(())
    }
}

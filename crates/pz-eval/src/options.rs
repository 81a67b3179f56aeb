//! Evaluation options.

use chrono::{Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{EvalError, EvalResult};

/// Options shared by every world of a [`crate::ProjectEvaluation`].
///
/// All times are in years.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Start of every simulated world.
    pub t_start: f64,
    /// Anchor of the discount envelope. Defaults to the current date.
    pub present: Option<f64>,
    /// Horizon passed to `run_until`.
    pub t_stop: f64,
    /// Annual discount rate; the per-year multiplier is `1 - discount_rate`.
    pub discount_rate: f64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            t_start: 1990.0,
            present: None,
            t_stop: 2100.0,
            discount_rate: 0.02,
        }
    }
}

impl EvalOptions {
    pub fn validate(&self) -> EvalResult<()> {
        if !self.t_start.is_finite() || !self.t_stop.is_finite() {
            return Err(EvalError::InvalidArg {
                what: "t_start and t_stop must be finite",
            });
        }
        if self.t_stop < self.t_start {
            return Err(EvalError::InvalidArg {
                what: "t_stop must not precede t_start",
            });
        }
        if !(0.0..1.0).contains(&self.discount_rate) {
            return Err(EvalError::InvalidArg {
                what: "discount_rate must be in [0, 1)",
            });
        }
        Ok(())
    }

    /// Per-year multiplier of the discount envelope.
    pub fn base_rate(&self) -> f64 {
        1.0 - self.discount_rate
    }

    /// `present`, or the current date as a fractional year.
    pub fn present_or_now(&self) -> f64 {
        self.present.unwrap_or_else(fractional_year_now)
    }
}

/// The current UTC instant as a fractional calendar year, e.g. `2026.79`.
pub fn fractional_year_now() -> f64 {
    let now = Utc::now();
    let days_in_year = NaiveDate::from_ymd_opt(now.year(), 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365) as f64;
    let day_fraction = now.num_seconds_from_midnight() as f64 / 86_400.0;
    now.year() as f64 + (now.ordinal0() as f64 + day_fraction) / days_in_year
}

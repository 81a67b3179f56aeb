//! Error types for series operations.

use pz_core::CoreError;
use thiserror::Error;

pub type StsResult<T> = Result<T, StsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StsError {
    #[error("Ordering violation in {series}: t={t} is not after last sample t={last}")]
    OrderingViolation { series: String, t: f64, last: f64 },

    #[error("{series} is undefined at t={t}")]
    UndefinedAtTime { series: String, t: f64 },

    #[error("Length mismatch: {times} times vs {values} values")]
    LengthMismatch { times: usize, values: usize },

    #[error("Invalid series configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Series identifier is {existing}, cannot rename to {attempted}")]
    Renamed { existing: String, attempted: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

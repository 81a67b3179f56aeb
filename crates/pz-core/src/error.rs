use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unit mismatch: cannot convert {from} to {to}")]
    UnitMismatch { from: String, to: String },

    #[error("Unknown unit symbol: {symbol}")]
    UnknownUnit { symbol: String },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

//! Error types for comparisons and evaluations.

use pz_core::CoreError;
use pz_sim::SimError;
use pz_sts::StsError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Series {key} is missing from world {world}")]
    MissingSeries { key: String, world: String },

    #[error("Cashflow series {key} is also defined in the baseline")]
    AmbiguousBaseline { key: String },

    #[error("Project {project} declares no after-tax cashflow")]
    NoCashflow { project: String },

    #[error("No comparison named {name}")]
    UnknownComparison { name: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Sts(#[from] StsError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type EvalResult<T> = Result<T, EvalError>;

//! Error types for simulation worlds.

use pz_core::CoreError;
use pz_graph::GraphError;
use pz_sts::StsError;
use thiserror::Error;

/// Errors raised while registering projects or running a [`crate::State`].
///
/// None of these are recoverable; the world is left at the failing instant
/// so it can be inspected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("{series} is written by {existing}; {attempted} cannot also write it")]
    MultipleWriters {
        series: String,
        existing: String,
        attempted: String,
    },

    #[error("{project} wrote {series} twice in one step")]
    DoubleWrite { series: String, project: String },

    #[error("{project} did not declare access to {series}")]
    UndeclaredAccess { series: String, project: String },

    #[error("Unknown series: {name}")]
    UnknownName { name: String },

    #[error("Project already added: {name}")]
    DuplicateProject { name: String },

    #[error("Time regression in {project}: t={t} is not after t_now={t_now}")]
    TimeRegression { project: String, t: f64, t_now: f64 },

    #[error("Emissions registration is closed; cannot register {series}")]
    RegistrationClosed { series: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Sts(#[from] StsError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Whether this is a unit mismatch from any layer.
    pub fn is_unit_mismatch(&self) -> bool {
        matches!(
            self,
            SimError::Core(CoreError::UnitMismatch { .. })
                | SimError::Sts(StsError::Core(CoreError::UnitMismatch { .. }))
        )
    }
}

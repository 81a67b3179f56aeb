//! pz-eval: compare simulated worlds and discount their differences.
//!
//! Provides:
//! - `ProjectComparison` (world with a project vs. baseline, discounted sums)
//! - `ProjectEvaluation` (one world per candidate, one shared baseline)
//! - impulse-response evaluation over every greenhouse gas
//! - `EvalOptions` (serde-loadable)

pub mod comparison;
pub mod error;
pub mod evaluation;
pub mod impulse;
pub mod options;

pub use comparison::{HEAT_FORCING, ProjectComparison};
pub use error::{EvalError, EvalResult};
pub use evaluation::{NetPresent, ProjectEvaluation};
pub use impulse::{EmissionsImpulse, impulse_response_evaluation};
pub use options::{EvalOptions, fractional_year_now};

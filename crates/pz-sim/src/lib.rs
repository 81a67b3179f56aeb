//! pz-sim: discrete-event simulation over named sparse time series.
//!
//! Provides:
//! - `Project`, the simulation actor interface
//! - `State`, the world: series, projects, emissions registry, scheduler
//! - registration contexts for declaring writes, `current` and `latest` reads
//! - `Current`, the per-step accessor
//! - `EmissionsAggregator`, the yearly sector/gas/CO2e roll-up

pub mod aggregator;
pub mod current;
pub mod emissions;
pub mod error;
pub mod project;
pub mod registration;
pub mod state;

mod scheduler;

pub use aggregator::{EmissionsAggregator, TOTAL_CO2E, national_name, sector_co2e_name, sector_name};
pub use current::Current;
pub use emissions::{EmissionsRegistry, Ghg};
pub use error::{SimError, SimResult};
pub use project::Project;
pub use registration::{Access, Registration};
pub use state::{State, StateOptions};

//! pz-core: stable foundation for the planzero simulation engine.
//!
//! Contains:
//! - units (runtime dimensions and units, parsing)
//! - registry (named units, SI scale factors taken from uom)
//! - quantity (magnitudes tagged with units)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod quantity;
pub mod registry;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use quantity::{Quantities, Quantity};
pub use units::{Dimension, Unit};

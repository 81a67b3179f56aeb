//! pz-sts: sparse, unit-aware, append-only time series.
//!
//! A series stores magnitudes in a fixed time unit and value unit and
//! answers pointwise queries with two freshness levels at the same instant:
//! inclusive (`current` reads) and exclusive (`latest` reads).

pub mod error;
pub mod mode;
pub mod ops;
pub mod series;

pub use error::{StsError, StsResult};
pub use mode::InterpolationMode;
pub use ops::{annual_summary, converted_to, product_aligned, scaled, sum_aligned};
pub use series::{SparseTimeSeries, StsBuilder};

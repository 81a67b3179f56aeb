use core::fmt;
use std::str::FromStr;

use crate::StsError;

/// How a pointwise query resolves times between samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InterpolationMode {
    /// Only exact sample times are defined.
    NoInterpolation,
    /// Most recent sample strictly before the query time.
    Latest,
    /// Most recent sample at or before the query time.
    #[default]
    Current,
}

impl InterpolationMode {
    /// Side policy used by [`crate::SparseTimeSeries::query`].
    pub fn inclusive(self) -> bool {
        !matches!(self, InterpolationMode::Latest)
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterpolationMode::NoInterpolation => "no_interpolation",
            InterpolationMode::Latest => "latest",
            InterpolationMode::Current => "current",
        })
    }
}

impl FromStr for InterpolationMode {
    type Err = StsError;

    fn from_str(s: &str) -> Result<Self, StsError> {
        match s {
            "no_interpolation" => Ok(InterpolationMode::NoInterpolation),
            "latest" => Ok(InterpolationMode::Latest),
            "current" => Ok(InterpolationMode::Current),
            _ => Err(StsError::InvalidConfig {
                what: "unknown interpolation mode",
            }),
        }
    }
}

//! Derived series: unit conversion, scaling and pointwise arithmetic over
//! year-indexed summaries.

use pz_core::{Quantity, Unit};

use crate::{InterpolationMode, SparseTimeSeries, StsError, StsResult};

/// An empty yearly `no_interpolation` series.
pub fn annual_summary(v_unit: Unit) -> SparseTimeSeries {
    SparseTimeSeries::new(v_unit).into_mode(InterpolationMode::NoInterpolation)
}

/// Copy of `sts` with values re-expressed in `unit`.
pub fn converted_to(sts: &SparseTimeSeries, unit: &Unit) -> StsResult<SparseTimeSeries> {
    let f = sts.v_unit().factor_to(unit)?;
    Ok(sts.derived(
        unit.clone(),
        sts.raw_default() * f,
        sts.times().to_vec(),
        sts.values().iter().map(|v| v * f).collect(),
    ))
}

/// Copy of `sts` multiplied by `factor`; the value unit composes.
pub fn scaled(sts: &SparseTimeSeries, factor: &Quantity) -> SparseTimeSeries {
    let k = factor.value();
    let default = match sts.interpolation() {
        InterpolationMode::NoInterpolation => f64::NAN,
        _ => sts.raw_default() * k,
    };
    sts.derived(
        sts.v_unit() * factor.unit(),
        default,
        sts.times().to_vec(),
        sts.values().iter().map(|v| v * k).collect(),
    )
}

fn require_aligned(sts: &SparseTimeSeries) -> StsResult<()> {
    if sts.interpolation() != InterpolationMode::NoInterpolation {
        return Err(StsError::InvalidConfig {
            what: "pointwise arithmetic requires no_interpolation series",
        });
    }
    Ok(())
}

/// Times present in every series, each converted to the first series' time unit.
fn common_times(series: &[&SparseTimeSeries]) -> StsResult<Vec<f64>> {
    let Some((first, rest)) = series.split_first() else {
        return Ok(Vec::new());
    };
    let mut times = first.times().to_vec();
    for other in rest {
        let f = first.t_unit().factor_to(other.t_unit())?;
        times.retain(|t| {
            let tt = t * f;
            other.times().binary_search_by(|x| x.total_cmp(&tt)).is_ok()
        });
    }
    Ok(times)
}

/// Pointwise product of two `no_interpolation` series at their common times.
pub fn product_aligned(a: &SparseTimeSeries, b: &SparseTimeSeries) -> StsResult<SparseTimeSeries> {
    require_aligned(a)?;
    require_aligned(b)?;
    let times = common_times(&[a, b])?;
    let f = a.t_unit().factor_to(b.t_unit())?;
    let values = times
        .iter()
        .map(|&t| Ok(a.value_at(t, true)? * b.value_at(t * f, true)?))
        .collect::<StsResult<Vec<f64>>>()?;
    Ok(a.derived(a.v_unit() * b.v_unit(), f64::NAN, times, values))
}

/// Pointwise sum of `no_interpolation` series at their common times, in the
/// first series' value unit.
pub fn sum_aligned(series: &[&SparseTimeSeries]) -> StsResult<SparseTimeSeries> {
    let Some(first) = series.first() else {
        return Ok(annual_summary(Unit::dimensionless()));
    };
    for s in series {
        require_aligned(s)?;
    }
    let times = common_times(series)?;
    let mut values = vec![0.0; times.len()];
    for s in series {
        let tf = first.t_unit().factor_to(s.t_unit())?;
        let vf = s.v_unit().factor_to(first.v_unit())?;
        for (acc, &t) in values.iter_mut().zip(&times) {
            *acc += s.value_at(t * tf, true)? * vf;
        }
    }
    Ok(first.derived(first.v_unit().clone(), f64::NAN, times, values))
}

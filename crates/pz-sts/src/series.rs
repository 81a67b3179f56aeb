//! The sparse, unit-aware, append-only time series.

use pz_core::registry::year;
use pz_core::{Dimension, Quantities, Quantity, Unit, ensure_finite};

use crate::{InterpolationMode, StsError, StsResult};

/// A stepwise function of time known at finitely many sample times.
///
/// Times and values are stored as magnitudes in the fixed `t_unit` and
/// `v_unit`. `values[0]` is the default slot (possibly NaN) that applies
/// before the first sample, so `values.len() == times.len() + 1` always.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SparseTimeSeries {
    t_unit: Unit,
    v_unit: Unit,
    times: Vec<f64>,
    values: Vec<f64>,
    interpolation: InterpolationMode,
    poison_nan: bool,
    writer: Option<String>,
    current_readers: Vec<String>,
    identifier: Option<String>,
}

impl SparseTimeSeries {
    /// Empty series with no default value, yearly time axis, `current` mode.
    pub fn new(v_unit: Unit) -> Self {
        Self {
            t_unit: year(),
            v_unit,
            times: Vec::new(),
            values: vec![f64::NAN],
            interpolation: InterpolationMode::Current,
            poison_nan: false,
            writer: None,
            current_readers: Vec::new(),
            identifier: None,
        }
    }

    /// Empty series whose unit and default come from `default_value`.
    pub fn with_default(default_value: Quantity) -> Self {
        let mut sts = Self::new(default_value.unit().clone());
        sts.values[0] = default_value.value();
        sts
    }

    pub fn builder(v_unit: Unit) -> StsBuilder {
        StsBuilder::new(v_unit)
    }

    pub fn t_unit(&self) -> &Unit {
        &self.t_unit
    }

    pub fn v_unit(&self) -> &Unit {
        &self.v_unit
    }

    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    pub fn is_poisonous(&self) -> bool {
        self.poison_nan
    }

    /// Number of declared samples (the default slot is not counted).
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample times, in `t_unit`.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Declared sample values, in `v_unit`. Excludes the default slot.
    pub fn values(&self) -> &[f64] {
        &self.values[1..]
    }

    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// The default slot, `None` when it is NaN.
    pub fn default_value(&self) -> Option<Quantity> {
        let v = self.values[0];
        (!v.is_nan()).then(|| Quantity::new(v, self.v_unit.clone()))
    }

    pub fn has_default(&self) -> bool {
        !self.values[0].is_nan()
    }

    fn label(&self) -> String {
        self.identifier
            .clone()
            .unwrap_or_else(|| String::from("<unnamed series>"))
    }

    fn undefined(&self, t: f64) -> StsError {
        StsError::UndefinedAtTime {
            series: self.label(),
            t,
        }
    }

    // ---- registration metadata --------------------------------------------------

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Set the identifier once; setting the same name again is a no-op.
    pub fn set_identifier(&mut self, name: &str) -> StsResult<()> {
        match &self.identifier {
            Some(existing) if existing != name => Err(StsError::Renamed {
                existing: existing.clone(),
                attempted: name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.identifier = Some(name.to_string());
                Ok(())
            }
        }
    }

    pub fn writer(&self) -> Option<&str> {
        self.writer.as_deref()
    }

    pub fn set_writer(&mut self, project: &str) {
        self.writer = Some(project.to_string());
    }

    pub fn current_readers(&self) -> &[String] {
        &self.current_readers
    }

    pub fn add_current_reader(&mut self, project: &str) {
        if !self.current_readers.iter().any(|r| r == project) {
            self.current_readers.push(project.to_string());
        }
    }

    /// Whether `other` could stand in for this series: same time and value
    /// dimensions.
    pub fn is_compatible_with(&self, other: &SparseTimeSeries) -> bool {
        self.t_unit.is_compatible(&other.t_unit) && self.v_unit.is_compatible(&other.v_unit)
    }

    // ---- mutation ---------------------------------------------------------------

    /// Append a sample given as raw magnitudes in `t_unit` / `v_unit`.
    /// Times must be finite; values may be NaN.
    pub fn append_raw(&mut self, t: f64, v: f64) -> StsResult<()> {
        let t = ensure_finite(t, "sample time")?;
        if let Some(last) = self.last_time() {
            if !(t > last) {
                return Err(StsError::OrderingViolation {
                    series: self.label(),
                    t,
                    last,
                });
            }
        }
        self.times.push(t);
        self.values.push(v);
        Ok(())
    }

    pub fn append(&mut self, t: &Quantity, v: &Quantity) -> StsResult<()> {
        let tt = t.value_in(&self.t_unit)?;
        let vv = v.value_in(&self.v_unit)?;
        self.append_raw(tt, vv)
    }

    /// Batch append. Validates the whole batch before touching the series,
    /// so a failure leaves it unchanged.
    pub fn extend(&mut self, times: &[Quantity], values: &[Quantity]) -> StsResult<()> {
        if times.len() != values.len() {
            return Err(StsError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        let mut tts = Vec::with_capacity(times.len());
        let mut vvs = Vec::with_capacity(values.len());
        let mut last = self.last_time();
        for (t, v) in times.iter().zip(values) {
            let tt = ensure_finite(t.value_in(&self.t_unit)?, "sample time")?;
            if let Some(prev) = last {
                if !(tt > prev) {
                    return Err(StsError::OrderingViolation {
                        series: self.label(),
                        t: tt,
                        last: prev,
                    });
                }
            }
            tts.push(tt);
            vvs.push(v.value_in(&self.v_unit)?);
            last = Some(tt);
        }
        self.times.extend(tts);
        self.values.extend(vvs);
        Ok(())
    }

    // ---- queries ----------------------------------------------------------------

    /// Index into `values` answering a query at `t` (in `t_unit`).
    fn slot(&self, t: f64, inclusive: bool) -> Option<usize> {
        match self.interpolation {
            InterpolationMode::NoInterpolation => {
                let i = self.times.partition_point(|&x| x < t);
                (i < self.times.len() && self.times[i] == t).then_some(i + 1)
            }
            InterpolationMode::Current | InterpolationMode::Latest => Some(if inclusive {
                self.times.partition_point(|&x| x <= t)
            } else {
                self.times.partition_point(|&x| x < t)
            }),
        }
    }

    /// Query at a raw time magnitude in `t_unit`; returns a magnitude in `v_unit`.
    pub fn value_at(&self, t: f64, inclusive: bool) -> StsResult<f64> {
        let slot = self.slot(t, inclusive).ok_or_else(|| self.undefined(t))?;
        let v = self.values[slot];
        if v.is_nan() && self.poison_nan {
            return Err(self.undefined(t));
        }
        Ok(v)
    }

    /// Value at `t`. `inclusive` selects the sample stamped exactly at `t`
    /// (a `current` read); otherwise the previous sample (a `latest` read).
    pub fn query_one(&self, t: &Quantity, inclusive: bool) -> StsResult<Quantity> {
        let tt = t.value_in(&self.t_unit)?;
        Ok(Quantity::new(
            self.value_at(tt, inclusive)?,
            self.v_unit.clone(),
        ))
    }

    /// Value at `t` using the series' own interpolation mode.
    pub fn query(&self, t: &Quantity) -> StsResult<Quantity> {
        self.query_one(t, self.interpolation.inclusive())
    }

    /// Vectorized query; `times` are magnitudes in `t_unit_of_times`.
    pub fn query_many(
        &self,
        times: &[f64],
        t_unit_of_times: &Unit,
        inclusive: bool,
    ) -> StsResult<Quantities> {
        let f = t_unit_of_times.factor_to(&self.t_unit)?;
        let values = times
            .iter()
            .map(|t| self.value_at(t * f, inclusive))
            .collect::<StsResult<Vec<f64>>>()?;
        Ok(Quantities::new(values, self.v_unit.clone()))
    }

    // ---- reductions -------------------------------------------------------------

    /// Largest declared sample, ignoring NaNs. `None` when there is none.
    pub fn max(&self) -> Option<Quantity> {
        self.values()
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
            .map(|v| Quantity::new(v, self.v_unit.clone()))
    }

    /// Sum of declared samples.
    pub fn sum(&self) -> Quantity {
        Quantity::new(self.values().iter().sum(), self.v_unit.clone())
    }

    // ---- derived series (used by ops) -------------------------------------------

    pub(crate) fn derived(
        &self,
        v_unit: Unit,
        default: f64,
        times: Vec<f64>,
        values: Vec<f64>,
    ) -> SparseTimeSeries {
        let mut all = Vec::with_capacity(values.len() + 1);
        all.push(default);
        all.extend(values);
        SparseTimeSeries {
            t_unit: self.t_unit.clone(),
            v_unit,
            times,
            values: all,
            interpolation: self.interpolation,
            poison_nan: self.poison_nan,
            writer: None,
            current_readers: Vec::new(),
            identifier: None,
        }
    }

    /// Same series under another mode. Switching to `no_interpolation`
    /// drops the default.
    pub(crate) fn into_mode(mut self, mode: InterpolationMode) -> SparseTimeSeries {
        if mode == InterpolationMode::NoInterpolation {
            self.values[0] = f64::NAN;
        }
        self.interpolation = mode;
        self
    }

    pub(crate) fn raw_default(&self) -> f64 {
        self.values[0]
    }
}

/// Fallible construction of a [`SparseTimeSeries`] with initial samples.
#[derive(Clone, Debug)]
pub struct StsBuilder {
    v_unit: Unit,
    t_unit: Unit,
    default_value: Option<Quantity>,
    interpolation: InterpolationMode,
    poison_nan: bool,
    times: Vec<Quantity>,
    values: Vec<Quantity>,
}

impl StsBuilder {
    pub fn new(v_unit: Unit) -> Self {
        Self {
            v_unit,
            t_unit: year(),
            default_value: None,
            interpolation: InterpolationMode::Current,
            poison_nan: false,
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn t_unit(mut self, t_unit: Unit) -> Self {
        self.t_unit = t_unit;
        self
    }

    pub fn default_value(mut self, value: Quantity) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Queries that would return NaN fail with `UndefinedAtTime` instead.
    pub fn poison_nan(mut self) -> Self {
        self.poison_nan = true;
        self
    }

    pub fn samples(mut self, times: Vec<Quantity>, values: Vec<Quantity>) -> Self {
        self.times = times;
        self.values = values;
        self
    }

    pub fn build(self) -> StsResult<SparseTimeSeries> {
        if self.t_unit.dimension() != Dimension::TIME {
            return Err(StsError::InvalidConfig {
                what: "time unit must have the dimension of time",
            });
        }
        let default = match &self.default_value {
            Some(q) => {
                if self.interpolation == InterpolationMode::NoInterpolation {
                    return Err(StsError::InvalidConfig {
                        what: "no_interpolation series cannot have a default value",
                    });
                }
                q.value_in(&self.v_unit)?
            }
            None => f64::NAN,
        };
        let mut sts = SparseTimeSeries::new(self.v_unit);
        sts.t_unit = self.t_unit;
        sts.interpolation = self.interpolation;
        sts.poison_nan = self.poison_nan;
        sts.values[0] = default;
        sts.extend(&self.times, &self.values)?;
        Ok(sts)
    }
}

//! Discounted differences between a world with a project and its baseline.

use pz_core::registry::{cad, tonne, year};
use pz_core::{Quantities, Quantity, year_of};
use pz_sim::{Project, State, TOTAL_CO2E};
use pz_sts::SparseTimeSeries;

use crate::{EvalError, EvalResult};

/// Canonical heat-forcing series. Callers supply the project that writes it.
pub const HEAT_FORCING: &str = "Annual_Heat_Energy_forcing";

/// World A (with `project`) against world B (baseline), discounted from
/// `present`.
///
/// Discounting is per integer year: year `y >= y_present` is weighted by
/// `base_rate^(y - y_present)` and earlier years are ignored. `base_rate`
/// is the per-year multiplier, i.e. `1 - discount_rate`.
#[derive(Clone, Copy)]
pub struct ProjectComparison<'a> {
    state_a: &'a State,
    state_b: &'a State,
    present: f64,
    project: &'a dyn Project,
}

fn in_years(t: f64, state: &State) -> EvalResult<f64> {
    Ok(Quantity::new(t, state.t_unit().clone()).value_in(&year())?)
}

impl<'a> ProjectComparison<'a> {
    /// `present` is in years.
    pub fn new(
        state_a: &'a State,
        state_b: &'a State,
        present: f64,
        project: &'a dyn Project,
    ) -> Self {
        Self {
            state_a,
            state_b,
            present,
            project,
        }
    }

    pub fn state_a(&self) -> &'a State {
        self.state_a
    }

    pub fn state_b(&self) -> &'a State {
        self.state_b
    }

    pub fn project(&self) -> &'a dyn Project {
        self.project
    }

    pub fn present(&self) -> f64 {
        self.present
    }

    pub fn present_year(&self) -> i64 {
        year_of(self.present)
    }

    /// Integer years from the earlier start to the later `t_now`, inclusive.
    pub fn years_as_list(&self) -> EvalResult<Vec<i64>> {
        let start = in_years(self.state_a.t_start(), self.state_a)?
            .min(in_years(self.state_b.t_start(), self.state_b)?);
        let stop = in_years(self.state_a.t_now(), self.state_a)?
            .max(in_years(self.state_b.t_now(), self.state_b)?);
        Ok((year_of(start)..=year_of(stop)).collect())
    }

    pub fn years(&self) -> EvalResult<Quantities> {
        let years = self.years_as_list()?;
        Ok(Quantities::new(
            years.into_iter().map(|y| y as f64).collect(),
            year(),
        ))
    }

    fn series(&self, state: &'a State, key: &str) -> EvalResult<&'a SparseTimeSeries> {
        state.get_sts(key).ok_or_else(|| EvalError::MissingSeries {
            key: key.to_string(),
            world: state.name().to_string(),
        })
    }

    /// Years at or after the present year, with their envelope weights.
    fn envelope(&self, base_rate: f64) -> EvalResult<(Vec<f64>, Vec<f64>)> {
        let y0 = self.present_year();
        let (years, weights) = self
            .years_as_list()?
            .into_iter()
            .filter(|&y| y >= y0)
            .map(|y| (y as f64, base_rate.powi((y - y0) as i32)))
            .unzip();
        Ok((years, weights))
    }

    fn weighted_sum(values: &Quantities, weights: &[f64]) -> Quantity {
        let total = values
            .values()
            .iter()
            .zip(weights)
            .map(|(v, w)| v * w)
            .sum();
        Quantity::new(total, values.unit().clone())
    }

    /// Year-by-year `A - B` for `key`, over [`Self::years`], in A's unit.
    pub fn delta(&self, key: &str) -> EvalResult<Quantities> {
        let a = self.series(self.state_a, key)?;
        let b = self.series(self.state_b, key)?;
        let years: Vec<f64> = self.years()?.values().to_vec();
        let va = a.query_many(&years, &year(), true)?;
        let vb = b.query_many(&years, &year(), true)?;
        Ok(va.checked_sub(&vb)?)
    }

    /// `Σ_y (A[y] - B[y]) · base_rate^(y - y_present)` over `y >= y_present`.
    pub fn discounted_sum(&self, key: &str, base_rate: f64) -> EvalResult<Quantity> {
        let a = self.series(self.state_a, key)?;
        let b = self.series(self.state_b, key)?;
        let (years, weights) = self.envelope(base_rate)?;
        let va = a.query_many(&years, &year(), true)?;
        let vb = b.query_many(&years, &year(), true)?;
        Ok(Self::weighted_sum(&va.checked_sub(&vb)?, &weights))
    }

    /// Discounted after-tax cashflow of the project. The cashflow exists
    /// only in world A, so there is nothing to subtract.
    pub fn net_present_value(&self, base_rate: f64) -> EvalResult<Quantity> {
        let key = self
            .project
            .after_tax_cashflow_name()
            .ok_or_else(|| EvalError::NoCashflow {
                project: self.project.name().to_string(),
            })?;
        if self.state_b.contains_sts(key) {
            return Err(EvalError::AmbiguousBaseline {
                key: key.to_string(),
            });
        }
        let cashflow = self.series(self.state_a, key)?;
        let (years, weights) = self.envelope(base_rate)?;
        let values = cashflow.query_many(&years, &year(), true)?;
        Ok(Self::weighted_sum(&values, &weights))
    }

    pub fn net_present_heat(&self, base_rate: f64) -> EvalResult<Quantity> {
        self.discounted_sum(HEAT_FORCING, base_rate)
    }

    pub fn net_present_co2e(&self, base_rate: f64) -> EvalResult<Quantity> {
        self.discounted_sum(TOTAL_CO2E, base_rate)
    }

    /// `npv / np_CO2e` in CAD per tonne, or `None` when the project does not
    /// reduce emissions.
    pub fn cost_per_tonne_co2e(&self, base_rate: f64) -> EvalResult<Option<Quantity>> {
        let npv = self.net_present_value(base_rate)?;
        let co2e = self.net_present_co2e(base_rate)?;
        if !(co2e.value() < 0.0) {
            return Ok(None);
        }
        Ok(Some((npv / co2e).to(&(cad() / tonne()))?))
    }
}

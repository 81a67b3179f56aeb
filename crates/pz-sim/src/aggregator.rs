//! Yearly aggregation of registered emission contributors.

use std::collections::BTreeMap;

use pz_core::Quantity;
use pz_core::registry::{kilotonne, year};
use pz_sts::SparseTimeSeries;

use crate::emissions::Ghg;
use crate::{Current, Project, SimResult, State};

/// Canonical national total, in kt CO2e per year.
pub const TOTAL_CO2E: &str = "Predicted_Annual_Emitted_CO2e_mass";

/// `Predicted_Annual_Emitted_{ghg}_mass`
pub fn national_name(ghg: Ghg) -> String {
    format!("Predicted_Annual_Emitted_{ghg}_mass")
}

/// `Predicted_Annual_Emitted_{ghg}_mass_{catpath}`
pub fn sector_name(ghg: Ghg, catpath: &str) -> String {
    format!("Predicted_Annual_Emitted_{ghg}_mass_{catpath}")
}

/// `Predicted_Annual_Emitted_CO2e_mass_{catpath}`
pub fn sector_co2e_name(catpath: &str) -> String {
    format!("{TOTAL_CO2E}_{catpath}")
}

/// Sums every registered contributor once a year, per sector and gas, and
/// weights the sums by GWP-100 into CO2e totals.
///
/// Adding it closes emissions registration, so it sees the final set of
/// contributors.
#[derive(Debug, Clone)]
pub struct EmissionsAggregator {
    name: String,
}

impl EmissionsAggregator {
    pub fn new() -> Self {
        Self::named("EmissionsAggregator")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Default for EmissionsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn zero_kt() -> SparseTimeSeries {
    SparseTimeSeries::with_default(Quantity::new(0.0, kilotonne()))
}

impl Project for EmissionsAggregator {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        let cells = state.emissions().cells().clone();

        let mut reads = state.requiring_current(self);
        for names in cells.values().flat_map(|by_gas| by_gas.values()) {
            for name in names {
                reads.will_read_current(name)?;
            }
        }

        let mut defs = state.defining(self);
        for (catpath, by_gas) in &cells {
            for ghg in by_gas.keys() {
                defs.declare(&sector_name(*ghg, catpath), zero_kt())?;
            }
            defs.declare(&sector_co2e_name(catpath), zero_kt())?;
        }
        for ghg in Ghg::ALL {
            defs.declare(&national_name(ghg), zero_kt())?;
        }
        defs.declare(TOTAL_CO2E, zero_kt())?;

        Ok(Some(state.t_start()))
    }

    fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
        let kt = kilotonne();
        let cells = current.state().emissions().cells().clone();

        let mut national: BTreeMap<Ghg, f64> = Ghg::ALL.iter().map(|&g| (g, 0.0)).collect();
        let mut total_co2e = 0.0;
        for (catpath, by_gas) in &cells {
            let mut sector_co2e = 0.0;
            for (ghg, names) in by_gas {
                let mut mass = 0.0;
                for name in names {
                    mass += current.get(name)?.value_in(&kt)?;
                }
                current.set(&sector_name(*ghg, catpath), Quantity::new(mass, kt.clone()))?;
                *national.entry(*ghg).or_default() += mass;
                sector_co2e += mass * ghg.gwp_100();
            }
            current.set(
                &sector_co2e_name(catpath),
                Quantity::new(sector_co2e, kt.clone()),
            )?;
            total_co2e += sector_co2e;
        }
        for (ghg, mass) in national {
            current.set(&national_name(ghg), Quantity::new(mass, kt.clone()))?;
        }
        current.set(TOTAL_CO2E, Quantity::new(total_co2e, kt))?;

        Ok(Some(current.after_step()?))
    }

    fn may_register_emissions(&self) -> bool {
        false
    }

    fn requires_emissions_registration_closed(&self) -> bool {
        true
    }

    fn step_size(&self) -> Option<Quantity> {
        Some(Quantity::new(1.0, year()))
    }
}

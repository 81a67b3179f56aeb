//! Impulse-response evaluation: a one-year emissions pulse per gas.

use std::rc::Rc;

use pz_core::registry::{kilotonne, year};
use pz_core::{Quantity, year_of};
use pz_sim::{EmissionsAggregator, Ghg, Project, SimResult, State};
use pz_sts::SparseTimeSeries;

use crate::{EvalOptions, EvalResult, ProjectEvaluation};

/// Emits `co2e / gwp_100(ghg)` of `ghg` into `catpath` during one year.
#[derive(Debug, Clone)]
pub struct EmissionsImpulse {
    name: String,
    series: String,
    catpath: String,
    ghg: Ghg,
    co2e: Quantity,
    year: i64,
}

impl EmissionsImpulse {
    pub fn new(ghg: Ghg, co2e: Quantity, catpath: &str, year: i64) -> Self {
        let name = format!("Impulse_{ghg}");
        Self {
            series: format!("{name}_emissions"),
            name,
            catpath: catpath.to_string(),
            ghg,
            co2e,
            year,
        }
    }

    pub fn ghg(&self) -> Ghg {
        self.ghg
    }

    pub fn series_name(&self) -> &str {
        &self.series
    }
}

impl Project for EmissionsImpulse {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        let kt = kilotonne();
        let mass = self.co2e.value_in(&kt)? / self.ghg.gwp_100();
        let y = self.year as f64;
        let sts = SparseTimeSeries::builder(kt.clone())
            .default_value(Quantity::new(0.0, kt.clone()))
            .samples(
                vec![Quantity::new(y, year()), Quantity::new(y + 1.0, year())],
                vec![Quantity::new(mass, kt.clone()), Quantity::new(0.0, kt)],
            )
            .build()?;
        state.defining(self).declare(&self.series, sts)?;
        state.register_emission(&self.catpath, self.ghg, &self.series)?;
        Ok(None)
    }
}

/// One candidate per gas, each pulsing `co2e` into `catpath` in the present
/// year, with an [`EmissionsAggregator`] as the common project.
pub fn impulse_response_evaluation(
    co2e: Quantity,
    catpath: &str,
    opts: &EvalOptions,
) -> EvalResult<ProjectEvaluation> {
    let present = opts.present_or_now();
    let pulse_year = year_of(present);
    let opts = EvalOptions {
        present: Some(present),
        ..opts.clone()
    };
    let candidates = Ghg::ALL.into_iter().map(|ghg| {
        let project: Rc<dyn Project> =
            Rc::new(EmissionsImpulse::new(ghg, co2e.clone(), catpath, pulse_year));
        (project.name().to_string(), project)
    });
    let common: Vec<Rc<dyn Project>> = vec![Rc::new(EmissionsAggregator::new())];
    ProjectEvaluation::new(candidates, common, &opts)
}

//! One world per candidate project against a single shared baseline.

use std::collections::BTreeSet;
use std::rc::Rc;

use pz_core::Quantity;
use pz_core::registry::year;
use pz_sim::{Project, State, StateOptions};
use tracing::info;

use crate::{EvalError, EvalOptions, EvalResult, ProjectComparison};

struct Candidate {
    name: String,
    state: State,
    project: Rc<dyn Project>,
}

/// Net-present summary of one candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct NetPresent {
    pub eval_name: String,
    pub npv: Quantity,
    pub np_heat: Quantity,
}

/// Candidate worlds, each holding one candidate plus every common project,
/// and one baseline world holding only the common projects.
pub struct ProjectEvaluation {
    baseline: State,
    candidates: Vec<Candidate>,
    common: Vec<Rc<dyn Project>>,
    present: f64,
}

impl ProjectEvaluation {
    pub fn new(
        candidates: impl IntoIterator<Item = (String, Rc<dyn Project>)>,
        common: Vec<Rc<dyn Project>>,
        opts: &EvalOptions,
    ) -> EvalResult<Self> {
        opts.validate()?;
        let state_opts = |name: String| StateOptions {
            name,
            t_start: opts.t_start,
            t_unit: year(),
        };

        let mut baseline = State::new(state_opts(String::from("Baseline")));
        baseline.add_projects(common.iter().cloned())?;

        let mut worlds = Vec::new();
        for (name, project) in candidates {
            if worlds.iter().any(|c: &Candidate| c.name == name) {
                return Err(EvalError::InvalidArg {
                    what: "candidate names must be unique",
                });
            }
            let mut state = State::new(state_opts(format!("StateA_{name}")));
            state.add_project(Rc::clone(&project))?;
            state.add_projects(common.iter().cloned())?;
            worlds.push(Candidate {
                name,
                state,
                project,
            });
        }

        Ok(Self {
            baseline,
            candidates: worlds,
            common,
            present: opts.present_or_now(),
        })
    }

    pub fn present(&self) -> f64 {
        self.present
    }

    pub fn baseline(&self) -> &State {
        &self.baseline
    }

    pub fn common_projects(&self) -> &[Rc<dyn Project>] {
        &self.common
    }

    /// Every world, baseline first.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        std::iter::once(&self.baseline).chain(self.candidates.iter().map(|c| &c.state))
    }

    pub fn eval_names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.name.as_str())
    }

    /// Runs every world to `t_stop`. Stops at the first failing world.
    pub fn run_until(&mut self, t_stop: f64) -> EvalResult<()> {
        info!(
            worlds = self.candidates.len() + 1,
            t_stop, "running evaluation"
        );
        self.baseline.run_until(t_stop)?;
        for c in &mut self.candidates {
            c.state.run_until(t_stop)?;
        }
        Ok(())
    }

    /// Union of series names across all worlds.
    pub fn all_sts_names(&self) -> BTreeSet<String> {
        self.states()
            .flat_map(|s| s.sts_names().map(str::to_string))
            .collect()
    }

    pub fn comparison(&self, eval_name: &str) -> EvalResult<ProjectComparison<'_>> {
        self.comparisons()
            .find(|(name, _)| *name == eval_name)
            .map(|(_, cmp)| cmp)
            .ok_or_else(|| EvalError::UnknownComparison {
                name: eval_name.to_string(),
            })
    }

    pub fn comparisons(&self) -> impl Iterator<Item = (&str, ProjectComparison<'_>)> {
        self.candidates.iter().map(|c| {
            (
                c.name.as_str(),
                ProjectComparison::new(&c.state, &self.baseline, self.present, c.project.as_ref()),
            )
        })
    }

    /// Net present value and heat of every candidate at `discount_rate`.
    ///
    /// No project in this workspace writes [`HEAT_FORCING`](crate::HEAT_FORCING).
    /// Unless a common project defines it, every item is
    /// [`EvalError::MissingSeries`].
    pub fn iterate(&self, discount_rate: f64) -> impl Iterator<Item = EvalResult<NetPresent>> + '_ {
        let base_rate = 1.0 - discount_rate;
        self.comparisons().map(move |(name, cmp)| {
            Ok(NetPresent {
                eval_name: name.to_string(),
                npv: cmp.net_present_value(base_rate)?,
                np_heat: cmp.net_present_heat(base_rate)?,
            })
        })
    }
}

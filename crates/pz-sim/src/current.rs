//! Per-step accessor over a project's declared series.

use std::collections::BTreeSet;
use std::rc::Rc;

use pz_core::Quantity;
use pz_sts::StsError;

use crate::{Project, SimError, SimResult, State};

/// What a project may touch while it steps at `t_now`.
///
/// Reads are inclusive at `t_now`, so a `current` read sees a writer that
/// already stepped at this instant. Each writable name may be set once; the
/// write moves it to the readable set.
pub struct Current<'s> {
    state: &'s mut State,
    project: Rc<dyn Project>,
    readable: BTreeSet<String>,
    writable: BTreeSet<String>,
    written: BTreeSet<String>,
}

impl<'s> Current<'s> {
    pub(crate) fn new(state: &'s mut State, project: Rc<dyn Project>) -> Self {
        let (readable, writable) = state
            .declarations
            .get(project.name())
            .map(|d| (d.reads_current.clone(), d.writes.clone()))
            .unwrap_or_default();
        Self {
            state,
            project,
            readable,
            writable,
            written: BTreeSet::new(),
        }
    }

    pub fn t_now(&self) -> f64 {
        self.state.t_now()
    }

    /// Read-only view of the whole world, e.g. for `latest` reads.
    pub fn state(&self) -> &State {
        &*self.state
    }

    pub fn project_name(&self) -> &str {
        self.project.name()
    }

    fn undeclared(&self, name: &str) -> SimError {
        if self.state.contains_sts(name) {
            SimError::UndeclaredAccess {
                series: name.to_string(),
                project: self.project.name().to_string(),
            }
        } else {
            SimError::UnknownName {
                name: name.to_string(),
            }
        }
    }

    /// Value of `name` at `t_now`, including this instant's sample.
    ///
    /// A writable name read before it is written yields the last earlier
    /// value; that read fails with `UndefinedAtTime` if nothing defines it.
    pub fn get(&self, name: &str) -> SimResult<Quantity> {
        let pre_write = self.writable.contains(name) && !self.written.contains(name);
        if !(pre_write || self.readable.contains(name) || self.written.contains(name)) {
            return Err(self.undeclared(name));
        }
        let sts = self.state.sts(name)?;
        let value = sts.query_one(&self.state.now(), true)?;
        if pre_write && value.is_nan() {
            return Err(StsError::UndefinedAtTime {
                series: name.to_string(),
                t: self.state.t_now(),
            }
            .into());
        }
        Ok(value)
    }

    /// Value of `name` finalized strictly before `t_now`. Any series may be
    /// read this way.
    pub fn latest(&self, name: &str) -> SimResult<Quantity> {
        self.state.latest(name)
    }

    /// Append `value` to `name` at `t_now`.
    pub fn set(&mut self, name: &str, value: Quantity) -> SimResult<()> {
        if self.written.contains(name) {
            return Err(SimError::DoubleWrite {
                series: name.to_string(),
                project: self.project.name().to_string(),
            });
        }
        if !self.writable.contains(name) {
            return Err(self.undeclared(name));
        }
        let now = self.state.now();
        let sts = self
            .state
            .sts
            .get_mut(name)
            .ok_or_else(|| SimError::UnknownName {
                name: name.to_string(),
            })?;
        sts.append(&now, &value)?;
        self.writable.remove(name);
        self.written.insert(name.to_string());
        self.readable.insert(name.to_string());
        Ok(())
    }

    /// Names still writable in this step.
    pub fn pending_writes(&self) -> impl Iterator<Item = &str> {
        self.writable.iter().map(String::as_str)
    }

    /// `t_now` plus the project's step size, in the state's time unit.
    pub fn after_step(&self) -> SimResult<f64> {
        let step = self.project.step_size().ok_or(SimError::InvalidArg {
            what: "project has no step size",
        })?;
        Ok(self.state.t_now() + step.value_in(self.state.t_unit())?)
    }
}

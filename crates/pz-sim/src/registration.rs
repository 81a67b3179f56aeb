//! Registration contexts handed out by [`State::defining`],
//! [`State::requiring_current`] and [`State::requiring_latest`].

use pz_core::CoreError;
use pz_sts::SparseTimeSeries;
use tracing::trace;

use crate::{SimError, SimResult, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The project is the series' unique writer.
    Define,
    /// Same-instant read; the writer steps first.
    Current,
    /// Previous-instant read.
    Latest,
}

/// Declares one project's access to named series.
///
/// `declare` creates the series from the prototype when the name is new;
/// otherwise the existing series is kept and the prototype only has to be
/// unit-compatible with it.
pub struct Registration<'s> {
    state: &'s mut State,
    project: String,
    access: Access,
}

impl<'s> Registration<'s> {
    pub(crate) fn new(state: &'s mut State, project: &str, access: Access) -> Self {
        Self {
            state,
            project: project.to_string(),
            access,
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Declare access to `name`, creating it from `prototype` if absent.
    pub fn declare(&mut self, name: &str, prototype: SparseTimeSeries) -> SimResult<&mut Self> {
        match self.state.sts.get(name) {
            Some(existing) => {
                if !existing.is_compatible_with(&prototype) {
                    return Err(SimError::Core(CoreError::UnitMismatch {
                        from: prototype.v_unit().symbol(),
                        to: existing.v_unit().symbol(),
                    }));
                }
                self.check_writer(existing)?;
            }
            None => {
                let mut sts = prototype;
                sts.set_identifier(name)?;
                trace!(state = %self.state.name(), series = name, unit = %sts.v_unit(), "new series");
                self.state.sts.insert(name.to_string(), sts);
                self.state.mark_dirty();
            }
        }
        self.record(name)?;
        Ok(self)
    }

    /// Declare access to a series some other project already created.
    pub fn declare_existing(&mut self, name: &str) -> SimResult<&mut Self> {
        let existing = self.state.sts(name)?;
        self.check_writer(existing)?;
        self.record(name)?;
        Ok(self)
    }

    /// Shorthand for [`Registration::declare_existing`] in a `current` context.
    pub fn will_read_current(&mut self, name: &str) -> SimResult<&mut Self> {
        if self.access != Access::Current {
            return Err(SimError::InvalidArg {
                what: "will_read_current needs a requiring_current context",
            });
        }
        self.declare_existing(name)
    }

    fn check_writer(&self, existing: &SparseTimeSeries) -> SimResult<()> {
        if self.access != Access::Define {
            return Ok(());
        }
        match existing.writer() {
            Some(writer) if writer != self.project => Err(SimError::MultipleWriters {
                series: existing.identifier().unwrap_or_default().to_string(),
                existing: writer.to_string(),
                attempted: self.project.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn record(&mut self, name: &str) -> SimResult<()> {
        let sts = self
            .state
            .sts
            .get_mut(name)
            .ok_or_else(|| SimError::UnknownName {
                name: name.to_string(),
            })?;
        let decls = self.state.declarations.entry(self.project.clone()).or_default();
        match self.access {
            Access::Define => {
                sts.set_writer(&self.project);
                decls.writes.insert(name.to_string());
            }
            Access::Current => {
                sts.add_current_reader(&self.project);
                decls.reads_current.insert(name.to_string());
            }
            Access::Latest => {
                decls.reads_latest.insert(name.to_string());
            }
        }
        trace!(project = %self.project, series = name, access = ?self.access, "declared");
        self.state.mark_dirty();
        Ok(())
    }
}

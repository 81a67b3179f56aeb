//! The simulation actor interface.

use std::rc::Rc;

use pz_core::Quantity;

use crate::{Current, SimResult, State};

/// A named unit of simulation.
///
/// A project holds only immutable configuration. It declares its reads and
/// writes in [`Project::on_add`] and mutates the world through the
/// [`Current`] accessor handed to [`Project::step`].
///
/// Projects are shared as `Rc<dyn Project>` between the states of an
/// evaluation. Simulations are single-threaded.
pub trait Project {
    /// Unique name within a [`State`].
    fn name(&self) -> &str;

    /// Declare writes and reads through [`State::defining`],
    /// [`State::requiring_current`] and [`State::requiring_latest`].
    ///
    /// Returns the first fire time in the state's time unit, or `None` to
    /// stay unscheduled.
    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>>;

    /// Advance at `current.t_now()`. Returns the next fire time, which must
    /// be strictly later, or `None` to stop.
    fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
        let _ = current;
        Ok(None)
    }

    /// Projects added to the state right after this one.
    fn sub_projects(&self) -> Vec<Rc<dyn Project>> {
        Vec::new()
    }

    /// Emitters are added before projects that consume the emissions registry.
    fn may_register_emissions(&self) -> bool {
        true
    }

    /// Adding this project closes emissions registration.
    fn requires_emissions_registration_closed(&self) -> bool {
        false
    }

    fn step_size(&self) -> Option<Quantity> {
        None
    }

    /// Series holding this project's after-tax cashflow, if any.
    fn after_tax_cashflow_name(&self) -> Option<&str> {
        None
    }
}

//! The simulation world and its scheduler loop.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use pz_core::registry::{kilotonne, year};
use pz_core::{Quantity, Unit};
use pz_graph::DependencyGraph;
use pz_sts::SparseTimeSeries;
use tracing::{debug, info, trace};

use crate::emissions::{EmissionsRegistry, Ghg};
use crate::registration::{Access, Registration};
use crate::scheduler::Schedule;
use crate::{Current, Project, SimError, SimResult};

/// Options for a new [`State`].
#[derive(Clone, Debug)]
pub struct StateOptions {
    /// Label used in logs and evaluation reports.
    pub name: String,
    /// Simulation start, in `t_unit`. Also the initial `t_now`.
    pub t_start: f64,
    /// Time unit of every time handed to or returned by the state.
    pub t_unit: Unit,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            name: String::from("state"),
            t_start: 1990.0,
            t_unit: year(),
        }
    }
}

/// Names a project declared in `on_add`.
#[derive(Debug, Default, Clone)]
pub(crate) struct Declarations {
    pub writes: BTreeSet<String>,
    pub reads_current: BTreeSet<String>,
    pub reads_latest: BTreeSet<String>,
}

/// A simulation world: named series, the projects that read and write them,
/// and the event heap that advances `t_now`.
pub struct State {
    name: String,
    t_start: f64,
    t_unit: Unit,
    t_now: f64,
    pub(crate) sts: BTreeMap<String, SparseTimeSeries>,
    projects: Vec<Rc<dyn Project>>,
    project_index: HashMap<String, usize>,
    pub(crate) declarations: HashMap<String, Declarations>,
    project_t_next: Vec<Option<f64>>,
    emissions: EmissionsRegistry,
    /// `None` whenever a registration changed the dependency graph.
    schedule: Option<Schedule>,
}

impl State {
    pub fn new(opts: StateOptions) -> Self {
        Self {
            name: opts.name,
            t_start: opts.t_start,
            t_unit: opts.t_unit,
            t_now: opts.t_start,
            sts: BTreeMap::new(),
            projects: Vec::new(),
            project_index: HashMap::new(),
            declarations: HashMap::new(),
            project_t_next: Vec::new(),
            emissions: EmissionsRegistry::default(),
            schedule: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn t_now(&self) -> f64 {
        self.t_now
    }

    pub fn t_unit(&self) -> &Unit {
        &self.t_unit
    }

    /// `t_now` as a quantity.
    pub fn now(&self) -> Quantity {
        Quantity::new(self.t_now, self.t_unit.clone())
    }

    // ---- series -----------------------------------------------------------------

    pub fn sts(&self, name: &str) -> SimResult<&SparseTimeSeries> {
        self.sts.get(name).ok_or_else(|| SimError::UnknownName {
            name: name.to_string(),
        })
    }

    pub fn get_sts(&self, name: &str) -> Option<&SparseTimeSeries> {
        self.sts.get(name)
    }

    pub fn contains_sts(&self, name: &str) -> bool {
        self.sts.contains_key(name)
    }

    /// Series names in sorted order.
    pub fn sts_names(&self) -> impl Iterator<Item = &str> {
        self.sts.keys().map(String::as_str)
    }

    /// Value of `name` finalized strictly before `t_now`.
    pub fn latest(&self, name: &str) -> SimResult<Quantity> {
        let sts = self.sts(name)?;
        Ok(sts.query_one(&self.now(), false)?)
    }

    // ---- projects ---------------------------------------------------------------

    pub fn project(&self, name: &str) -> Option<&Rc<dyn Project>> {
        self.project_index.get(name).map(|&i| &self.projects[i])
    }

    pub fn contains_project(&self, name: &str) -> bool {
        self.project_index.contains_key(name)
    }

    pub fn project_names(&self) -> impl Iterator<Item = &str> {
        self.projects.iter().map(|p| p.name())
    }

    /// Next fire time of `project`, `None` when unscheduled or unknown.
    pub fn project_t_next(&self, project: &str) -> Option<f64> {
        self.project_index
            .get(project)
            .and_then(|&i| self.project_t_next[i])
    }

    /// Series `project` declared as writes.
    pub fn writes_of(&self, project: &str) -> impl Iterator<Item = &str> {
        self.declarations
            .get(project)
            .into_iter()
            .flat_map(|d| d.writes.iter().map(String::as_str))
    }

    /// Series `project` declared as `current` reads.
    pub fn current_reads_of(&self, project: &str) -> impl Iterator<Item = &str> {
        self.declarations
            .get(project)
            .into_iter()
            .flat_map(|d| d.reads_current.iter().map(String::as_str))
    }

    /// Series `project` declared as `latest` reads.
    pub fn latest_reads_of(&self, project: &str) -> impl Iterator<Item = &str> {
        self.declarations
            .get(project)
            .into_iter()
            .flat_map(|d| d.reads_latest.iter().map(String::as_str))
    }

    /// Add `project`, call its `on_add`, then add its sub-projects through
    /// [`State::add_projects`].
    pub fn add_project(&mut self, project: Rc<dyn Project>) -> SimResult<()> {
        let name = project.name().to_string();
        if self.project_index.contains_key(&name) {
            return Err(SimError::DuplicateProject { name });
        }
        trace!(state = %self.name, project = %name, "adding project");

        // The first project that needs the final contributor set closes it.
        if project.requires_emissions_registration_closed() {
            self.emissions.close();
        }

        let index = self.projects.len();
        self.projects.push(Rc::clone(&project));
        self.project_index.insert(name.clone(), index);
        self.declarations.insert(name, Declarations::default());
        self.project_t_next.push(None);
        self.mark_dirty();

        let t_first = project.on_add(self)?;
        self.project_t_next[index] = t_first;

        self.add_projects(project.sub_projects())
    }

    /// Add several projects; those that may register emissions go first.
    pub fn add_projects(
        &mut self,
        projects: impl IntoIterator<Item = Rc<dyn Project>>,
    ) -> SimResult<()> {
        let mut projects: Vec<_> = projects.into_iter().collect();
        projects.sort_by_key(|p| !p.may_register_emissions());
        for project in projects {
            self.add_project(project)?;
        }
        Ok(())
    }

    // ---- registration -----------------------------------------------------------

    /// Context through which `project` declares the series it writes.
    pub fn defining(&mut self, project: &dyn Project) -> Registration<'_> {
        Registration::new(self, project.name(), Access::Define)
    }

    /// Context for same-instant reads; each read orders `project` after the
    /// series' writer.
    pub fn requiring_current(&mut self, project: &dyn Project) -> Registration<'_> {
        Registration::new(self, project.name(), Access::Current)
    }

    /// Context for previous-instant reads; adds no ordering constraint.
    pub fn requiring_latest(&mut self, project: &dyn Project) -> Registration<'_> {
        Registration::new(self, project.name(), Access::Latest)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.schedule = None;
    }

    pub fn emissions(&self) -> &EmissionsRegistry {
        &self.emissions
    }

    /// Record `series` as a contributor to the `(catpath, ghg)` cell.
    pub fn register_emission(&mut self, catpath: &str, ghg: Ghg, series: &str) -> SimResult<()> {
        if self.emissions.is_closed() {
            return Err(SimError::RegistrationClosed {
                series: series.to_string(),
            });
        }
        let sts = self.sts(series)?;
        sts.v_unit().factor_to(&kilotonne())?;
        trace!(state = %self.name, catpath, %ghg, series, "register emission");
        self.emissions.insert(catpath, ghg, series)
    }

    pub fn close_emissions_registration(&mut self) {
        self.emissions.close();
    }

    // ---- scheduling -------------------------------------------------------------

    fn dependency_graph(&self) -> SimResult<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for project in &self.projects {
            graph.add_project(project.name())?;
        }
        for name in self.sts.keys() {
            graph.add_series(name)?;
        }
        for (name, sts) in &self.sts {
            if let Some(writer) = sts.writer() {
                graph.add_writer(writer, name)?;
            }
            for reader in sts.current_readers() {
                graph.add_current_reader(name, reader)?;
            }
        }
        Ok(graph)
    }

    /// Build graph and heap if a registration invalidated them.
    fn ensure_schedule(&mut self) -> SimResult<()> {
        if self.schedule.is_some() {
            return Ok(());
        }
        let graph = self.dependency_graph()?;
        let order = graph.project_order()?;
        let ranks = order
            .iter()
            .enumerate()
            .filter_map(|(rank, name)| self.project_index.get(name).map(|&i| (i, rank)))
            .collect();
        let mut schedule = Schedule::new(ranks);
        for (index, t_next) in self.project_t_next.iter().enumerate() {
            if let Some(t) = t_next {
                schedule.push(*t, index);
            }
        }
        info!(
            state = %self.name,
            projects = graph.project_count(),
            series = graph.series_count(),
            edges = graph.edge_count(),
            scheduled = schedule.len(),
            "built dependency graph"
        );
        self.schedule = Some(schedule);
        Ok(())
    }

    /// Step projects in (fire time, rank) order until the next event is
    /// after `t_stop` or none remain. A `t_stop` before `t_now` does nothing.
    pub fn run_until(&mut self, t_stop: f64) -> SimResult<()> {
        if t_stop < self.t_now {
            return Ok(());
        }
        self.ensure_schedule()?;

        loop {
            let Some(schedule) = self.schedule.as_mut() else {
                break;
            };
            match schedule.peek() {
                Some(ev) if ev.t <= t_stop => {}
                _ => break,
            }
            let Some(ev) = schedule.pop() else {
                break;
            };

            let project = Rc::clone(&self.projects[ev.project]);
            if !(ev.t >= self.t_now) {
                return Err(SimError::TimeRegression {
                    project: project.name().to_string(),
                    t: ev.t,
                    t_now: self.t_now,
                });
            }
            self.t_now = ev.t;
            debug!(state = %self.name, project = project.name(), t = ev.t, "step");

            let next = {
                let mut current = Current::new(self, Rc::clone(&project));
                project.step(&mut current)?
            };
            self.project_t_next[ev.project] = next;

            if let Some(new_t) = next {
                if !(new_t > self.t_now) {
                    return Err(SimError::TimeRegression {
                        project: project.name().to_string(),
                        t: new_t,
                        t_now: self.t_now,
                    });
                }
                if let Some(schedule) = self.schedule.as_mut() {
                    schedule.push(new_t, ev.project);
                }
            }
        }
        Ok(())
    }
}

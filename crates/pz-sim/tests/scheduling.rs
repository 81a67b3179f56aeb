//! Scheduler and registration scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use pz_core::registry::{kilogram, meter, year};
use pz_core::{Quantity, Unit};
use pz_graph::GraphError;
use pz_sim::{Access, Current, Project, SimError, SimResult, State, StateOptions};
use pz_sts::{SparseTimeSeries, StsError};

type Trace = Rc<RefCell<Vec<(String, f64)>>>;

fn state_at(t_start: f64) -> State {
    State::new(StateOptions {
        name: "test".into(),
        t_start,
        t_unit: year(),
    })
}

fn meters(default: f64) -> SparseTimeSeries {
    SparseTimeSeries::with_default(Quantity::new(default, meter()))
}

/// Writes `10 * t` metres to `out` at t = first..=last.
struct Ramp {
    name: String,
    out: String,
    first: f64,
    last: f64,
    trace: Trace,
}

impl Ramp {
    fn new(name: &str, out: &str, first: f64, last: f64, trace: &Trace) -> Self {
        Self {
            name: name.into(),
            out: out.into(),
            first,
            last,
            trace: Rc::clone(trace),
        }
    }
}

impl Project for Ramp {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        state.defining(self).declare(&self.out, meters(0.0))?;
        Ok(Some(self.first))
    }

    fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
        let t = current.t_now();
        self.trace.borrow_mut().push((self.name.clone(), t));
        current.set(&self.out, Quantity::new(10.0 * t, meter()))?;
        Ok((t < self.last).then(|| t + 1.0))
    }
}

/// Reads `input` with the given freshness at t = first..=last.
struct Recorder {
    name: String,
    input: String,
    access: Access,
    first: f64,
    last: f64,
    seen: RefCell<Vec<f64>>,
    trace: Trace,
}

impl Recorder {
    fn new(name: &str, input: &str, access: Access, first: f64, last: f64, trace: &Trace) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            access,
            first,
            last,
            seen: RefCell::new(Vec::new()),
            trace: Rc::clone(trace),
        }
    }
}

impl Project for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        match self.access {
            Access::Latest => {
                state.requiring_latest(self).declare(&self.input, meters(0.0))?;
            }
            _ => {
                state.requiring_current(self).declare(&self.input, meters(0.0))?;
            }
        }
        Ok(Some(self.first))
    }

    fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
        let t = current.t_now();
        self.trace.borrow_mut().push((self.name.clone(), t));
        let q = match self.access {
            Access::Latest => current.latest(&self.input)?,
            _ => current.get(&self.input)?,
        };
        self.seen.borrow_mut().push(q.value_in(&meter())?);
        Ok((t < self.last).then(|| t + 1.0))
    }
}

/// Reads `input` currently and writes `out = input + 1 m`, once a year.
struct Relay {
    name: String,
    input: String,
    out: String,
    trace: Trace,
}

impl Project for Relay {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        state.requiring_current(self).declare(&self.input, meters(0.0))?;
        state.defining(self).declare(&self.out, meters(0.0))?;
        Ok(Some(0.0))
    }

    fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
        self.trace
            .borrow_mut()
            .push((self.name.clone(), current.t_now()));
        let v = current.get(&self.input)?;
        current.set(&self.out, v.checked_add(&Quantity::new(1.0, meter()))?)?;
        let next = current.after_step()?;
        Ok((next <= 2.0).then_some(next))
    }

    fn step_size(&self) -> Option<Quantity> {
        Some(Quantity::new(1.0, year()))
    }
}

/// Runs a closure as its step; used for misbehaving projects.
struct Custom<F> {
    name: String,
    writes: Vec<String>,
    first: Option<f64>,
    step: F,
}

impl<F> Project for Custom<F>
where
    F: Fn(&mut Current<'_>) -> SimResult<Option<f64>>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        let mut defs = state.defining(self);
        for w in &self.writes {
            defs.declare(w, meters(0.0))?;
        }
        Ok(self.first)
    }

    fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
        (self.step)(current)
    }
}

fn custom<F>(name: &str, writes: &[&str], first: Option<f64>, step: F) -> Rc<dyn Project>
where
    F: Fn(&mut Current<'_>) -> SimResult<Option<f64>> + 'static,
{
    Rc::new(Custom {
        name: name.into(),
        writes: writes.iter().map(|w| w.to_string()).collect(),
        first,
        step,
    })
}

#[test]
fn current_reader_sees_same_instant_writes() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    let reader = Rc::new(Recorder::new("R", "x", Access::Current, 1.0, 3.0, &trace));
    // reader added first; rank still puts the writer ahead of it
    state.add_project(reader.clone()).unwrap();
    state
        .add_project(Rc::new(Ramp::new("W", "x", 1.0, 3.0, &trace)))
        .unwrap();

    state.run_until(10.0).unwrap();

    assert_eq!(*reader.seen.borrow(), vec![10.0, 20.0, 30.0]);
    assert_eq!(state.sts("x").unwrap().writer(), Some("W"));
    assert_eq!(state.sts("x").unwrap().current_readers(), ["R".to_string()]);
}

#[test]
fn latest_reader_sees_previous_instant() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    let current = Rc::new(Recorder::new("R", "y", Access::Current, 1.0, 2.0, &trace));
    let latest = Rc::new(Recorder::new("R2", "y", Access::Latest, 1.0, 2.0, &trace));
    state
        .add_project(Rc::new(Ramp::new("W", "y", 1.0, 2.0, &trace)))
        .unwrap();
    state.add_project(current.clone()).unwrap();
    state.add_project(latest.clone()).unwrap();

    state.run_until(2.0).unwrap();

    assert_eq!(*current.seen.borrow(), vec![10.0, 20.0]);
    assert_eq!(*latest.seen.borrow(), vec![0.0, 10.0]);
    assert!(state.sts("y").unwrap().current_readers().iter().all(|r| r != "R2"));
}

#[test]
fn same_instant_steps_follow_topological_order() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    let p3 = Rc::new(Recorder::new("P3", "r", Access::Current, 0.0, 2.0, &trace));
    let p2 = Rc::new(Relay {
        name: "P2".into(),
        input: "q".into(),
        out: "r".into(),
        trace: Rc::clone(&trace),
    });
    let p1 = Rc::new(Ramp::new("P1", "q", 0.0, 2.0, &trace));
    state.add_project(p3.clone()).unwrap();
    state.add_project(p2).unwrap();
    state.add_project(p1).unwrap();

    state.run_until(2.0).unwrap();

    let steps: Vec<(String, f64)> = trace.borrow().clone();
    let expected: Vec<(String, f64)> = [0.0, 1.0, 2.0]
        .iter()
        .flat_map(|&t| ["P1", "P2", "P3"].map(|p| (p.to_string(), t)))
        .collect();
    assert_eq!(steps, expected);
    // r = q + 1 = 10 t + 1, seen by P3 in the same instant
    assert_eq!(*p3.seen.borrow(), vec![1.0, 11.0, 21.0]);
}

#[test]
fn second_writer_is_rejected_and_first_kept() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    state
        .add_project(Rc::new(Ramp::new("A", "z", 0.0, 0.0, &trace)))
        .unwrap();
    let err = state
        .add_project(Rc::new(Ramp::new("B", "z", 0.0, 0.0, &trace)))
        .unwrap_err();
    assert!(matches!(err, SimError::MultipleWriters { ref existing, .. } if existing == "A"));
    assert_eq!(state.sts("z").unwrap().writer(), Some("A"));
}

#[test]
fn duplicate_project_is_rejected() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    state
        .add_project(Rc::new(Ramp::new("A", "z", 0.0, 0.0, &trace)))
        .unwrap();
    let err = state
        .add_project(Rc::new(Ramp::new("A", "w", 0.0, 0.0, &trace)))
        .unwrap_err();
    assert_eq!(err, SimError::DuplicateProject { name: "A".into() });
}

#[test]
fn incompatible_redeclaration_is_a_unit_mismatch() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    state
        .add_project(Rc::new(Ramp::new("A", "z", 0.0, 0.0, &trace)))
        .unwrap();
    struct Heavy;
    impl Project for Heavy {
        fn name(&self) -> &str {
            "heavy"
        }
        fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
            let proto = SparseTimeSeries::new(kilogram());
            state.requiring_current(self).declare("z", proto)?;
            Ok(None)
        }
    }
    let err = state.add_project(Rc::new(Heavy)).unwrap_err();
    assert!(err.is_unit_mismatch());
}

#[test]
fn double_write_fails() {
    let mut state = state_at(0.0);
    state
        .add_project(custom("D", &["a"], Some(0.0), |cur| {
            cur.set("a", Quantity::new(1.0, meter()))?;
            cur.set("a", Quantity::new(2.0, meter()))?;
            Ok(None)
        }))
        .unwrap();
    let err = state.run_until(1.0).unwrap_err();
    assert!(matches!(err, SimError::DoubleWrite { .. }));
    assert_eq!(state.sts("a").unwrap().values(), &[1.0]);
}

#[test]
fn undeclared_and_unknown_reads_fail() {
    let mut state = state_at(0.0);
    state
        .add_project(custom("owner", &["secret"], None, |_| Ok(None)))
        .unwrap();
    state
        .add_project(custom("snoop", &[], Some(0.0), |cur| {
            let undeclared = cur.get("secret").unwrap_err();
            assert!(matches!(undeclared, SimError::UndeclaredAccess { .. }));
            let unknown = cur.get("nothing").unwrap_err();
            assert!(matches!(unknown, SimError::UnknownName { .. }));
            let write = cur.set("secret", Quantity::new(1.0, meter())).unwrap_err();
            assert!(matches!(write, SimError::UndeclaredAccess { .. }));
            // latest reads need no declaration
            cur.latest("secret")?;
            Ok(None)
        }))
        .unwrap();
    state.run_until(0.0).unwrap();
    assert!(matches!(
        state.latest("nothing"),
        Err(SimError::UnknownName { .. })
    ));
}

#[test]
fn reading_own_output_before_writing_needs_a_value() {
    let mut state = state_at(0.0);
    struct Counter;
    impl Project for Counter {
        fn name(&self) -> &str {
            "counter"
        }
        fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
            state
                .defining(self)
                .declare("n", SparseTimeSeries::new(Unit::dimensionless()))?;
            Ok(Some(0.0))
        }
        fn step(&self, current: &mut Current<'_>) -> SimResult<Option<f64>> {
            let prev = current.get("n")?;
            current.set("n", prev.checked_add(&Quantity::dimensionless(1.0))?)?;
            Ok(Some(current.t_now() + 1.0))
        }
    }
    state.add_project(Rc::new(Counter)).unwrap();
    let err = state.run_until(0.0).unwrap_err();
    assert!(matches!(err, SimError::Sts(StsError::UndefinedAtTime { .. })));
}

#[test]
fn rescheduling_into_the_past_is_a_time_regression() {
    let mut state = state_at(0.0);
    state
        .add_project(custom("stuck", &[], Some(1.0), |cur| Ok(Some(cur.t_now()))))
        .unwrap();
    let err = state.run_until(5.0).unwrap_err();
    assert!(matches!(err, SimError::TimeRegression { t, t_now, .. } if t == 1.0 && t_now == 1.0));
    assert_eq!(state.t_now(), 1.0);
}

#[test]
fn current_cycle_is_detected_at_graph_build() {
    let mut state = state_at(0.0);
    struct Loop {
        name: &'static str,
        reads: &'static str,
        writes: &'static str,
    }
    impl Project for Loop {
        fn name(&self) -> &str {
            self.name
        }
        fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
            state.requiring_current(self).declare(self.reads, meters(0.0))?;
            state.defining(self).declare(self.writes, meters(0.0))?;
            Ok(Some(0.0))
        }
    }
    state
        .add_project(Rc::new(Loop {
            name: "A",
            reads: "y",
            writes: "x",
        }))
        .unwrap();
    state
        .add_project(Rc::new(Loop {
            name: "B",
            reads: "x",
            writes: "y",
        }))
        .unwrap();
    let err = state.run_until(1.0).unwrap_err();
    assert!(matches!(
        err,
        SimError::Graph(GraphError::CycleDetected { .. })
    ));
}

#[test]
fn run_until_before_now_is_a_no_op() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    state
        .add_project(Rc::new(Ramp::new("W", "x", 0.0, 5.0, &trace)))
        .unwrap();
    state.run_until(3.0).unwrap();
    assert_eq!(state.t_now(), 3.0);
    let steps = trace.borrow().len();

    state.run_until(1.0).unwrap();
    assert_eq!(state.t_now(), 3.0);
    assert_eq!(trace.borrow().len(), steps);

    state.run_until(5.0).unwrap();
    assert_eq!(state.sts("x").unwrap().times(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn projects_added_mid_run_join_the_schedule() {
    let trace = Trace::default();
    let mut state = state_at(0.0);
    state
        .add_project(Rc::new(Ramp::new("W", "x", 0.0, 5.0, &trace)))
        .unwrap();
    state.run_until(2.0).unwrap();

    let reader = Rc::new(Recorder::new("R", "x", Access::Current, 3.0, 5.0, &trace));
    state.add_project(reader.clone()).unwrap();
    state.run_until(5.0).unwrap();
    assert_eq!(*reader.seen.borrow(), vec![30.0, 40.0, 50.0]);

    let late = Rc::new(Recorder::new("late", "x", Access::Current, 1.0, 1.0, &trace));
    state.add_project(late).unwrap();
    let err = state.run_until(6.0).unwrap_err();
    assert!(matches!(err, SimError::TimeRegression { .. }));
}

#[test]
fn sub_projects_are_added_with_their_parent() {
    let trace = Trace::default();
    struct Parent {
        children: Vec<Rc<dyn Project>>,
    }
    impl Project for Parent {
        fn name(&self) -> &str {
            "parent"
        }
        fn on_add(&self, _state: &mut State) -> SimResult<Option<f64>> {
            Ok(None)
        }
        fn sub_projects(&self) -> Vec<Rc<dyn Project>> {
            self.children.clone()
        }
    }
    let mut state = state_at(0.0);
    state
        .add_project(Rc::new(Parent {
            children: vec![
                Rc::new(Ramp::new("a", "xa", 0.0, 1.0, &trace)),
                Rc::new(Ramp::new("b", "xb", 0.0, 1.0, &trace)),
            ],
        }))
        .unwrap();
    assert_eq!(
        state.project_names().collect::<Vec<_>>(),
        ["parent", "a", "b"]
    );
    assert_eq!(state.project_t_next("parent"), None);
    state.run_until(1.0).unwrap();
    assert_eq!(state.sts("xb").unwrap().len(), 2);
    assert_eq!(state.writes_of("a").collect::<Vec<_>>(), ["xa"]);
}

//! Emissions registry and aggregator behaviour.

use std::rc::Rc;

use pz_core::Quantity;
use pz_core::registry::{kilotonne, meter, tonne, year};
use pz_sim::{
    EmissionsAggregator, Ghg, Project, SimError, SimResult, State, StateOptions, TOTAL_CO2E,
    national_name, sector_co2e_name, sector_name,
};
use pz_sts::SparseTimeSeries;

/// Emits a constant mass per year from `from` onward into one sector.
struct Emitter {
    name: String,
    catpath: String,
    ghg: Ghg,
    tonnes: f64,
    from: f64,
}

impl Emitter {
    fn new(name: &str, catpath: &str, ghg: Ghg, tonnes: f64, from: f64) -> Rc<dyn Project> {
        Rc::new(Self {
            name: name.into(),
            catpath: catpath.into(),
            ghg,
            tonnes,
            from,
        })
    }
}

impl Project for Emitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
        let sts = SparseTimeSeries::builder(tonne())
            .default_value(Quantity::new(0.0, tonne()))
            .samples(
                vec![Quantity::new(self.from, year())],
                vec![Quantity::new(self.tonnes, tonne())],
            )
            .build()?;
        let series = format!("{}_emissions", self.name);
        state.defining(self).declare(&series, sts)?;
        state.register_emission(&self.catpath, self.ghg, &series)?;
        Ok(None)
    }
}

fn state() -> State {
    State::new(StateOptions {
        name: "emissions".into(),
        t_start: 2000.0,
        t_unit: year(),
    })
}

fn kt_at(state: &State, name: &str, t: f64) -> f64 {
    state
        .sts(name)
        .unwrap()
        .query_one(&Quantity::new(t, year()), true)
        .unwrap()
        .value_in(&kilotonne())
        .unwrap()
}

#[test]
fn aggregator_sums_by_sector_gas_and_co2e() {
    let mut state = state();
    state
        .add_projects([
            Rc::new(EmissionsAggregator::new()) as Rc<dyn Project>,
            Emitter::new("ships", "Transport/Marine", Ghg::CO2, 1000.0, 2001.0),
            Emitter::new("ferries", "Transport/Marine", Ghg::CO2, 500.0, 2002.0),
            Emitter::new("cows", "Agriculture/Enteric", Ghg::CH4, 100.0, 2000.0),
        ])
        .unwrap();
    state.run_until(2003.0).unwrap();

    let marine = sector_name(Ghg::CO2, "Transport/Marine");
    assert_eq!(kt_at(&state, &marine, 2000.0), 0.0);
    assert!((kt_at(&state, &marine, 2001.0) - 1.0).abs() < 1e-12);
    assert!((kt_at(&state, &marine, 2002.0) - 1.5).abs() < 1e-12);

    let enteric = sector_co2e_name("Agriculture/Enteric");
    assert!((kt_at(&state, &enteric, 2002.0) - 2.8).abs() < 1e-9);
    assert!((kt_at(&state, &national_name(Ghg::CH4), 2002.0) - 0.1).abs() < 1e-12);
    assert_eq!(kt_at(&state, &national_name(Ghg::SF6), 2002.0), 0.0);
    assert!((kt_at(&state, TOTAL_CO2E, 2002.0) - 4.3).abs() < 1e-9);

    // the aggregator steps yearly from t_start
    assert_eq!(
        state.sts(TOTAL_CO2E).unwrap().times(),
        &[2000.0, 2001.0, 2002.0, 2003.0]
    );
}

#[test]
fn emitters_are_added_before_the_aggregator() {
    let mut state = state();
    state
        .add_projects([
            Rc::new(EmissionsAggregator::new()) as Rc<dyn Project>,
            Emitter::new("ships", "Transport/Marine", Ghg::CO2, 1.0, 2000.0),
        ])
        .unwrap();
    assert_eq!(
        state.project_names().collect::<Vec<_>>(),
        ["ships", "EmissionsAggregator"]
    );
    assert_eq!(
        state.current_reads_of("EmissionsAggregator").collect::<Vec<_>>(),
        ["ships_emissions"]
    );
}

/// Owns an aggregator and an emitter, listed aggregator first.
struct Farm;

impl Project for Farm {
    fn name(&self) -> &str {
        "Farm"
    }

    fn on_add(&self, _state: &mut State) -> SimResult<Option<f64>> {
        Ok(None)
    }

    fn sub_projects(&self) -> Vec<Rc<dyn Project>> {
        vec![
            Rc::new(EmissionsAggregator::new()),
            Emitter::new("cows", "Agriculture/Enteric", Ghg::CH4, 100.0, 2000.0),
        ]
    }
}

#[test]
fn sub_project_emitters_are_added_before_the_aggregator() {
    let mut state = state();
    state.add_project(Rc::new(Farm)).unwrap();
    assert_eq!(
        state.project_names().collect::<Vec<_>>(),
        ["Farm", "cows", "EmissionsAggregator"]
    );

    state.run_until(2000.0).unwrap();
    assert!((kt_at(&state, TOTAL_CO2E, 2000.0) - 2.8).abs() < 1e-9);
}

#[test]
fn registration_closes_when_the_aggregator_joins() {
    let mut state = state();
    state
        .add_project(Rc::new(EmissionsAggregator::new()))
        .unwrap();
    assert!(state.emissions().is_closed());
    let err = state
        .add_project(Emitter::new("late", "Waste", Ghg::CH4, 1.0, 2000.0))
        .unwrap_err();
    assert!(matches!(err, SimError::RegistrationClosed { .. }));
}

#[test]
fn registering_requires_a_known_mass_series() {
    let mut state = state();
    let err = state
        .register_emission("Waste", Ghg::CH4, "missing")
        .unwrap_err();
    assert!(matches!(err, SimError::UnknownName { .. }));

    struct Lengthy;
    impl Project for Lengthy {
        fn name(&self) -> &str {
            "lengthy"
        }
        fn on_add(&self, state: &mut State) -> SimResult<Option<f64>> {
            state
                .defining(self)
                .declare("road_km", SparseTimeSeries::new(meter()))?;
            state.register_emission("Transport/Road", Ghg::CO2, "road_km")?;
            Ok(None)
        }
    }
    let err = state.add_project(Rc::new(Lengthy)).unwrap_err();
    assert!(err.is_unit_mismatch());
}

#[test]
fn gwp_table() {
    let gwps: Vec<f64> = Ghg::ALL.iter().map(|g| g.gwp_100()).collect();
    assert_eq!(
        gwps,
        vec![1.0, 28.0, 265.0, 1430.0, 6630.0, 23500.0, 17200.0]
    );
}

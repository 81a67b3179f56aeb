//! Greenhouse gases and the sectoral emissions registry.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{SimError, SimResult};

/// Greenhouse gas species reported in national inventories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ghg {
    CO2,
    CH4,
    N2O,
    HFCs,
    PFCs,
    SF6,
    NF3,
}

impl Ghg {
    pub const ALL: [Ghg; 7] = [
        Ghg::CO2,
        Ghg::CH4,
        Ghg::N2O,
        Ghg::HFCs,
        Ghg::PFCs,
        Ghg::SF6,
        Ghg::NF3,
    ];

    /// 100-year global warming potential, in tonnes CO2e per tonne.
    pub fn gwp_100(self) -> f64 {
        match self {
            Ghg::CO2 => 1.0,
            Ghg::CH4 => 28.0,
            Ghg::N2O => 265.0,
            Ghg::HFCs => 1430.0,
            Ghg::PFCs => 6630.0,
            Ghg::SF6 => 23500.0,
            Ghg::NF3 => 17200.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ghg::CO2 => "CO2",
            Ghg::CH4 => "CH4",
            Ghg::N2O => "N2O",
            Ghg::HFCs => "HFCs",
            Ghg::PFCs => "PFCs",
            Ghg::SF6 => "SF6",
            Ghg::NF3 => "NF3",
        }
    }
}

impl fmt::Display for Ghg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ghg {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Ghg> {
        Ghg::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or(SimError::InvalidArg {
                what: "unknown greenhouse gas",
            })
    }
}

/// `catpath → ghg → contributing series names`.
#[derive(Debug, Clone, Default)]
pub struct EmissionsRegistry {
    cells: BTreeMap<String, BTreeMap<Ghg, Vec<String>>>,
    closed: bool,
}

impl EmissionsRegistry {
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Record `series` as a contributor. The caller checks the series exists.
    pub(crate) fn insert(&mut self, catpath: &str, ghg: Ghg, series: &str) -> SimResult<()> {
        if self.closed {
            return Err(SimError::RegistrationClosed {
                series: series.to_string(),
            });
        }
        let names = self
            .cells
            .entry(catpath.to_string())
            .or_default()
            .entry(ghg)
            .or_default();
        if !names.iter().any(|n| n == series) {
            names.push(series.to_string());
        }
        Ok(())
    }

    pub fn cells(&self) -> &BTreeMap<String, BTreeMap<Ghg, Vec<String>>> {
        &self.cells
    }

    pub fn contributors(&self, catpath: &str, ghg: Ghg) -> &[String] {
        self.cells
            .get(catpath)
            .and_then(|by_gas| by_gas.get(&ghg))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn catpaths(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

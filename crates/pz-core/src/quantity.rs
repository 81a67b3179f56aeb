//! Scalar and vector quantities: magnitudes tagged with a runtime [`Unit`].

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Div, Mul, Neg};

use crate::units::Unit;
use crate::{CoreError, CoreResult};

/// A real magnitude paired with a unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }

    /// Magnitude in this quantity's own unit.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn is_nan(&self) -> bool {
        self.value.is_nan()
    }

    /// Magnitude expressed in `unit`.
    pub fn value_in(&self, unit: &Unit) -> CoreResult<f64> {
        Ok(self.value * self.unit.factor_to(unit)?)
    }

    pub fn to(&self, unit: &Unit) -> CoreResult<Quantity> {
        Ok(Quantity::new(self.value_in(unit)?, unit.clone()))
    }

    /// Sum in `self`'s unit; `other` is converted first.
    pub fn checked_add(&self, other: &Quantity) -> CoreResult<Quantity> {
        Ok(Quantity::new(
            self.value + other.value_in(&self.unit)?,
            self.unit.clone(),
        ))
    }

    /// Difference in `self`'s unit; `other` is converted first.
    pub fn checked_sub(&self, other: &Quantity) -> CoreResult<Quantity> {
        Ok(Quantity::new(
            self.value - other.value_in(&self.unit)?,
            self.unit.clone(),
        ))
    }

    /// Compare across compatible units. `None` when either side is NaN.
    pub fn try_cmp(&self, other: &Quantity) -> CoreResult<Option<Ordering>> {
        Ok(self.value.partial_cmp(&other.value_in(&self.unit)?))
    }

    /// Sum of an iterator of quantities, expressed in `unit`.
    pub fn sum_in<'a>(
        items: impl IntoIterator<Item = &'a Quantity>,
        unit: &Unit,
    ) -> CoreResult<Quantity> {
        let mut total = 0.0;
        for q in items {
            total += q.value_in(unit)?;
        }
        Ok(Quantity::new(total, unit.clone()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.unit.symbol();
        if symbol.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, symbol)
        }
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::new(self.value * rhs, self.unit)
    }
}

impl Mul<Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        rhs * self
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.value * rhs.value, &self.unit * &rhs.unit)
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity::new(self.value / rhs, self.unit)
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.value / rhs.value, &self.unit / &rhs.unit)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::new(-self.value, self.unit)
    }
}

/// A vector of magnitudes sharing one unit, as returned by vectorized
/// series queries.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Quantities {
    values: Vec<f64>,
    unit: Unit,
}

impl Quantities {
    pub fn new(values: Vec<f64>, unit: Unit) -> Self {
        Self { values, unit }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Quantity> {
        self.values
            .get(index)
            .map(|v| Quantity::new(*v, self.unit.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.values
            .iter()
            .map(|v| Quantity::new(*v, self.unit.clone()))
    }

    pub fn to(&self, unit: &Unit) -> CoreResult<Quantities> {
        let f = self.unit.factor_to(unit)?;
        Ok(Quantities::new(
            self.values.iter().map(|v| v * f).collect(),
            unit.clone(),
        ))
    }

    /// Elementwise `self - other`, in `self`'s unit.
    pub fn checked_sub(&self, other: &Quantities) -> CoreResult<Quantities> {
        if self.len() != other.len() {
            return Err(CoreError::InvalidArg {
                what: "quantity vectors differ in length",
            });
        }
        let other = other.to(&self.unit)?;
        Ok(Quantities::new(
            self.values
                .iter()
                .zip(other.values())
                .map(|(a, b)| a - b)
                .collect(),
            self.unit.clone(),
        ))
    }
}

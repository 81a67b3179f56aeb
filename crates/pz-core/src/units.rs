// pz-core/src/units.rs

use core::fmt;
use core::ops::{Div, Mul};
use std::str::FromStr;

use crate::numeric::{Tolerances, nearly_equal};
use crate::{CoreError, CoreResult, registry};

/// Number of base dimensions tracked by [`Dimension`].
pub const BASE_DIMENSIONS: usize = 8;

/// Integer exponents over the base dimensions:
/// length, mass, time, temperature, amount, currency,
/// human population, bovine population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimension([i8; BASE_DIMENSIONS]);

impl Dimension {
    pub const NONE: Self = Self([0, 0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Self = Self([1, 0, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Self = Self([0, 1, 0, 0, 0, 0, 0, 0]);
    pub const TIME: Self = Self([0, 0, 1, 0, 0, 0, 0, 0]);
    pub const TEMPERATURE: Self = Self([0, 0, 0, 1, 0, 0, 0, 0]);
    pub const AMOUNT: Self = Self([0, 0, 0, 0, 1, 0, 0, 0]);
    pub const CURRENCY: Self = Self([0, 0, 0, 0, 0, 1, 0, 0]);
    pub const HUMAN_POPULATION: Self = Self([0, 0, 0, 0, 0, 0, 1, 0]);
    pub const BOVINE_POPULATION: Self = Self([0, 0, 0, 0, 0, 0, 0, 1]);

    pub fn exponents(&self) -> [i8; BASE_DIMENSIONS] {
        self.0
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }

    pub fn powi(self, n: i8) -> Self {
        let mut exps = self.0;
        for e in &mut exps {
            *e *= n;
        }
        Self(exps)
    }

    fn combine(self, other: Self, sign: i8) -> Self {
        let mut exps = self.0;
        for (e, o) in exps.iter_mut().zip(other.0) {
            *e += sign * o;
        }
        Self(exps)
    }

    /// `None` if any exponent leaves the `i8` range.
    pub fn checked_powi(self, n: i8) -> Option<Self> {
        let mut exps = self.0;
        for e in &mut exps {
            *e = e.checked_mul(n)?;
        }
        Some(Self(exps))
    }

    pub fn checked_mul(self, other: Self) -> Option<Self> {
        self.checked_combine(other, 1)
    }

    pub fn checked_div(self, other: Self) -> Option<Self> {
        self.checked_combine(other, -1)
    }

    fn checked_combine(self, other: Self, sign: i8) -> Option<Self> {
        let mut exps = self.0;
        for (e, o) in exps.iter_mut().zip(other.0) {
            *e = e.checked_add(o.checked_mul(sign)?)?;
        }
        Some(Self(exps))
    }
}

fn exponent_overflow() -> CoreError {
    CoreError::InvalidArg {
        what: "unit exponent out of range",
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        self.combine(rhs, 1)
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        self.combine(rhs, -1)
    }
}

/// A runtime unit: dimension, scale to SI base units, and a symbol.
///
/// Symbols are kept as numerator/denominator token lists so that composed
/// units always print in a form [`Unit::from_str`] can read back,
/// e.g. `CAD/t` or `W*m^-2`.
#[derive(Clone, Debug)]
pub struct Unit {
    dimension: Dimension,
    scale: f64,
    num: Vec<String>,
    den: Vec<String>,
}

impl Unit {
    /// A named unit with a single-token symbol.
    pub fn named(symbol: &str, dimension: Dimension, scale: f64) -> Self {
        Self {
            dimension,
            scale,
            num: if symbol.is_empty() {
                Vec::new()
            } else {
                vec![symbol.to_string()]
            },
            den: Vec::new(),
        }
    }

    pub fn dimensionless() -> Self {
        Self::named("", Dimension::NONE, 1.0)
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Multiplier taking a magnitude in this unit to SI base units.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn symbol(&self) -> String {
        let num = if self.num.is_empty() {
            String::from(if self.den.is_empty() { "" } else { "1" })
        } else {
            self.num.join("*")
        };
        if self.den.is_empty() {
            num
        } else {
            format!("{num}/{}", self.den.join("*"))
        }
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Factor `f` such that `x [self] == x * f [other]`.
    pub fn factor_to(&self, other: &Unit) -> CoreResult<f64> {
        if !self.is_compatible(other) {
            return Err(CoreError::UnitMismatch {
                from: self.symbol(),
                to: other.symbol(),
            });
        }
        Ok(self.scale / other.scale)
    }

    pub fn powi(&self, n: i8) -> Unit {
        let mut out = Unit::dimensionless();
        let base = if n >= 0 {
            self.clone()
        } else {
            &Unit::dimensionless() / self
        };
        for _ in 0..n.unsigned_abs() {
            out = &out * &base;
        }
        out
    }

    /// Like [`Unit::powi`], but fails instead of overflowing an exponent.
    /// `i8::MIN` is rejected so that every result can still be inverted.
    pub fn checked_powi(&self, n: i8) -> CoreResult<Unit> {
        n.checked_neg().ok_or_else(exponent_overflow)?;
        self.dimension
            .checked_powi(n)
            .ok_or_else(exponent_overflow)?;
        let base = if n >= 0 {
            self.clone()
        } else {
            Unit::dimensionless().checked_div(self)?
        };
        let mut out = Unit::dimensionless();
        for _ in 0..n.unsigned_abs() {
            out = out.checked_mul(&base)?;
        }
        Ok(out)
    }

    pub fn checked_mul(&self, rhs: &Unit) -> CoreResult<Unit> {
        let dimension = self
            .dimension
            .checked_mul(rhs.dimension)
            .ok_or_else(exponent_overflow)?;
        Ok(self.compose_as(rhs, false, dimension))
    }

    pub fn checked_div(&self, rhs: &Unit) -> CoreResult<Unit> {
        let dimension = self
            .dimension
            .checked_div(rhs.dimension)
            .ok_or_else(exponent_overflow)?;
        Ok(self.compose_as(rhs, true, dimension))
    }

    /// Operator form. Exponents must stay within `i8`; parsed input goes
    /// through the `checked_*` methods instead.
    fn compose(&self, rhs: &Unit, invert_rhs: bool) -> Unit {
        let dimension = if invert_rhs {
            self.dimension / rhs.dimension
        } else {
            self.dimension * rhs.dimension
        };
        self.compose_as(rhs, invert_rhs, dimension)
    }

    fn compose_as(&self, rhs: &Unit, invert_rhs: bool, dimension: Dimension) -> Unit {
        let (rhs_num, rhs_den) = if invert_rhs {
            (&rhs.den, &rhs.num)
        } else {
            (&rhs.num, &rhs.den)
        };
        let mut num = self.num.clone();
        let mut den = self.den.clone();
        for tok in rhs_num {
            match den.iter().position(|d| d == tok) {
                Some(i) => {
                    den.remove(i);
                }
                None => num.push(tok.clone()),
            }
        }
        for tok in rhs_den {
            match num.iter().position(|n| n == tok) {
                Some(i) => {
                    num.remove(i);
                }
                None => den.push(tok.clone()),
            }
        }
        let scale = if invert_rhs {
            self.scale / rhs.scale
        } else {
            self.scale * rhs.scale
        };
        Unit {
            dimension,
            scale,
            num,
            den,
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && nearly_equal(self.scale, other.scale, Tolerances::default())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

impl Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: &Unit) -> Unit {
        self.compose(rhs, false)
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        self.compose(&rhs, false)
    }
}

impl Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: &Unit) -> Unit {
        self.compose(rhs, true)
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        self.compose(&rhs, true)
    }
}

fn parse_token(token: &str) -> CoreResult<Unit> {
    let (base, exp) = match token.split_once('^') {
        Some((base, exp)) => {
            let exp = exp.parse::<i8>().map_err(|_| CoreError::UnknownUnit {
                symbol: token.to_string(),
            })?;
            (base, exp)
        }
        None => (token, 1),
    };
    let unit = registry::lookup(base).ok_or_else(|| CoreError::UnknownUnit {
        symbol: base.to_string(),
    })?;
    unit.checked_powi(exp)
}

fn parse_product(side: &str) -> CoreResult<Unit> {
    side.split(['*', ' '])
        .filter(|tok| !tok.is_empty())
        .try_fold(Unit::dimensionless(), |acc, tok| {
            acc.checked_mul(&parse_token(tok)?)
        })
}

impl FromStr for Unit {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Unit> {
        match s.split_once('/') {
            Some((num, den)) => parse_product(num)?.checked_div(&parse_product(den)?),
            None => parse_product(s),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Unit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.symbol())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Unit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}

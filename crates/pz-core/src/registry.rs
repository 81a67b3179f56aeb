//! Named units used by the evaluator.
//!
//! SI scale factors come from `uom` so that every named unit agrees with the
//! uom definitions; the non-SI dimensions (currency, populations) are defined
//! here.

use uom::si::f64::{
    AmountOfSubstance, Energy, Length, Mass, Power, Ratio, TemperatureInterval, Time, Volume,
};

use crate::units::{Dimension, Unit};

/// Exchange rate used for `USD`, expressed in `CAD`.
pub const CAD_PER_USD: f64 = 1.35;

fn energy_dim() -> Dimension {
    Dimension::MASS * Dimension::LENGTH.powi(2) / Dimension::TIME.powi(2)
}

fn power_dim() -> Dimension {
    energy_dim() / Dimension::TIME
}

pub fn dimensionless() -> Unit {
    Unit::dimensionless()
}

pub fn ppm() -> Unit {
    use uom::si::ratio::{part_per_million, ratio};
    Unit::named(
        "ppm",
        Dimension::NONE,
        Ratio::new::<part_per_million>(1.0).get::<ratio>(),
    )
}

pub fn ppb() -> Unit {
    use uom::si::ratio::{part_per_billion, ratio};
    Unit::named(
        "ppb",
        Dimension::NONE,
        Ratio::new::<part_per_billion>(1.0).get::<ratio>(),
    )
}

pub fn second() -> Unit {
    Unit::named("s", Dimension::TIME, 1.0)
}

pub fn hour() -> Unit {
    use uom::si::time::{hour, second};
    Unit::named("h", Dimension::TIME, Time::new::<hour>(1.0).get::<second>())
}

pub fn day() -> Unit {
    use uom::si::time::{day, second};
    Unit::named("d", Dimension::TIME, Time::new::<day>(1.0).get::<second>())
}

pub fn year() -> Unit {
    use uom::si::time::{second, year};
    Unit::named("yr", Dimension::TIME, Time::new::<year>(1.0).get::<second>())
}

pub fn meter() -> Unit {
    Unit::named("m", Dimension::LENGTH, 1.0)
}

pub fn kilometer() -> Unit {
    use uom::si::length::{kilometer, meter};
    Unit::named(
        "km",
        Dimension::LENGTH,
        Length::new::<kilometer>(1.0).get::<meter>(),
    )
}

pub fn liter() -> Unit {
    use uom::si::volume::{cubic_meter, liter};
    Unit::named(
        "L",
        Dimension::LENGTH.powi(3),
        Volume::new::<liter>(1.0).get::<cubic_meter>(),
    )
}

pub fn gram() -> Unit {
    use uom::si::mass::{gram, kilogram};
    Unit::named("g", Dimension::MASS, Mass::new::<gram>(1.0).get::<kilogram>())
}

pub fn kilogram() -> Unit {
    Unit::named("kg", Dimension::MASS, 1.0)
}

pub fn tonne() -> Unit {
    use uom::si::mass::{kilogram, ton};
    Unit::named("t", Dimension::MASS, Mass::new::<ton>(1.0).get::<kilogram>())
}

pub fn kilotonne() -> Unit {
    Unit::named("kt", Dimension::MASS, 1e3 * tonne().scale())
}

pub fn megatonne() -> Unit {
    Unit::named("Mt", Dimension::MASS, 1e6 * tonne().scale())
}

pub fn gigatonne() -> Unit {
    Unit::named("Gt", Dimension::MASS, 1e9 * tonne().scale())
}

pub fn joule() -> Unit {
    Unit::named("J", energy_dim(), 1.0)
}

pub fn exajoule() -> Unit {
    use uom::si::energy::{exajoule, joule};
    Unit::named(
        "EJ",
        energy_dim(),
        Energy::new::<exajoule>(1.0).get::<joule>(),
    )
}

pub fn watt() -> Unit {
    Unit::named("W", power_dim(), 1.0)
}

pub fn petawatt() -> Unit {
    use uom::si::power::{petawatt, watt};
    Unit::named("PW", power_dim(), Power::new::<petawatt>(1.0).get::<watt>())
}

pub fn kelvin() -> Unit {
    use uom::si::temperature_interval::kelvin;
    Unit::named(
        "K",
        Dimension::TEMPERATURE,
        TemperatureInterval::new::<kelvin>(1.0).get::<kelvin>(),
    )
}

pub fn mole() -> Unit {
    use uom::si::amount_of_substance::mole;
    Unit::named(
        "mol",
        Dimension::AMOUNT,
        AmountOfSubstance::new::<mole>(1.0).get::<mole>(),
    )
}

pub fn cad() -> Unit {
    Unit::named("CAD", Dimension::CURRENCY, 1.0)
}

pub fn mcad() -> Unit {
    Unit::named("MCAD", Dimension::CURRENCY, 1e6)
}

pub fn usd() -> Unit {
    Unit::named("USD", Dimension::CURRENCY, CAD_PER_USD)
}

pub fn people() -> Unit {
    Unit::named("people", Dimension::HUMAN_POPULATION, 1.0)
}

pub fn cattle() -> Unit {
    Unit::named("cattle", Dimension::BOVINE_POPULATION, 1.0)
}

/// Resolve a single symbol token (no `*`, `/` or `^`).
pub fn lookup(symbol: &str) -> Option<Unit> {
    let unit = match symbol {
        "" | "1" => dimensionless(),
        "ppm" => ppm(),
        "ppb" => ppb(),
        "s" => second(),
        "h" => hour(),
        "d" => day(),
        "yr" | "year" | "years" | "a" => year(),
        "m" => meter(),
        "km" => kilometer(),
        "L" => liter(),
        "g" => gram(),
        "kg" => kilogram(),
        "t" | "tonne" => tonne(),
        "kt" => kilotonne(),
        "Mt" => megatonne(),
        "Gt" => gigatonne(),
        "J" => joule(),
        "EJ" => exajoule(),
        "W" => watt(),
        "PW" => petawatt(),
        "K" => kelvin(),
        "mol" => mole(),
        "CAD" => cad(),
        "MCAD" => mcad(),
        "USD" => usd(),
        "people" => people(),
        "cattle" => cattle(),
        _ => return None,
    };
    Some(unit)
}

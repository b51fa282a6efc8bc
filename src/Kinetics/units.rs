//! Unit context: dimensional units of quantities and the unit systems used to
//! read and write configuration maps.
//!
//! Internally everything is kept in SI with kmol as the unit of quantity
//! (kg, m, s, K, kmol, J, Pa). Activation energies are stored as `E/R` in K.
use crate::Kinetics::rate_errors::RateError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};
use std::sync::LazyLock;

/// universal gas constant, J/(kmol·K)
pub const GAS_CONSTANT: f64 = 8314.462618;
/// Avogadro number, 1/kmol
pub const AVOGADRO: f64 = 6.02214076e26;
/// one standard atmosphere, Pa
pub const ONE_ATM: f64 = 101325.0;

static UNIT_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([*/])?\s*([A-Za-z]+|1)\s*(?:\^\s*(-?[0-9]+(?:\.[0-9]+)?))?\s*")
        .expect("unit term pattern is valid")
});

/// Dimensional units: a conversion factor to SI and exponents of the base dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    factor: f64,
    mass: f64,
    length: f64,
    time: f64,
    temperature: f64,
    quantity: f64,
}

impl Default for Units {
    fn default() -> Self {
        Units::new(1.0)
    }
}

impl Units {
    const fn base(
        factor: f64,
        mass: f64,
        length: f64,
        time: f64,
        temperature: f64,
        quantity: f64,
    ) -> Self {
        Self {
            factor,
            mass,
            length,
            time,
            temperature,
            quantity,
        }
    }
    /// dimensionless units with the given factor
    pub const fn new(factor: f64) -> Self {
        Units::base(factor, 0.0, 0.0, 0.0, 0.0, 0.0)
    }
    pub const fn temperature() -> Self {
        Units::base(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }
    pub const fn pressure() -> Self {
        Units::base(1.0, 1.0, -1.0, -2.0, 0.0, 0.0)
    }
    pub const fn energy() -> Self {
        Units::base(1.0, 1.0, 2.0, -2.0, 0.0, 0.0)
    }
    /// energy per amount of substance (J/kmol)
    pub const fn molar_energy() -> Self {
        Units::base(1.0, 1.0, 2.0, -2.0, 0.0, -1.0)
    }
    /// units of a rate constant of a reaction of the given overall order,
    /// i.e. (m^3/kmol)^(order-1)/s
    pub fn rate_constant(order: f64) -> Self {
        Units::base(1.0, 0.0, 3.0 * (order - 1.0), -1.0, 0.0, 1.0 - order)
    }

    /// Parses strings like `cm^3/mol/s`, `kcal/mol`, `1/s` or `kg m^2`.
    pub fn parse(units: &str) -> Result<Units, RateError> {
        let mut result = Units::new(1.0);
        let mut rest = units.trim();
        while !rest.is_empty() {
            let caps = UNIT_TERM.captures(rest).ok_or_else(|| {
                RateError::config(format!("Unable to parse unit string '{}'", units))
            })?;
            let consumed = caps.get(0).map_or(0, |m| m.end());
            if consumed == 0 {
                return Err(RateError::config(format!(
                    "Unable to parse unit string '{}'",
                    units
                )));
            }
            let divide = caps.get(1).is_some_and(|m| m.as_str() == "/");
            let symbol = &caps[2];
            let exponent = match caps.get(3) {
                Some(e) => e.as_str().parse::<f64>().map_err(|_| {
                    RateError::config(format!("Invalid exponent in unit string '{}'", units))
                })?,
                None => 1.0,
            };
            let term = if symbol == "1" {
                Units::new(1.0)
            } else {
                lookup_unit(symbol).ok_or_else(|| {
                    RateError::config(format!("Unknown unit '{}' in '{}'", symbol, units))
                })?
            };
            let term = term.pow(exponent);
            result = if divide { result / term } else { result * term };
            rest = &rest[consumed..];
        }
        Ok(result)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
    pub fn is_dimensionless(&self) -> bool {
        self.same_dimensions(&Units::new(1.0))
    }
    pub fn same_dimensions(&self, other: &Units) -> bool {
        self.mass == other.mass
            && self.length == other.length
            && self.time == other.time
            && self.temperature == other.temperature
            && self.quantity == other.quantity
    }
    pub fn pow(&self, exponent: f64) -> Units {
        Units::base(
            self.factor.powf(exponent),
            self.mass * exponent,
            self.length * exponent,
            self.time * exponent,
            self.temperature * exponent,
            self.quantity * exponent,
        )
    }
}

impl Mul for Units {
    type Output = Units;
    fn mul(self, rhs: Units) -> Units {
        Units::base(
            self.factor * rhs.factor,
            self.mass + rhs.mass,
            self.length + rhs.length,
            self.time + rhs.time,
            self.temperature + rhs.temperature,
            self.quantity + rhs.quantity,
        )
    }
}

impl Div for Units {
    type Output = Units;
    fn div(self, rhs: Units) -> Units {
        self * rhs.pow(-1.0)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dims = [
            ("kg", self.mass),
            ("m", self.length),
            ("s", self.time),
            ("K", self.temperature),
            ("kmol", self.quantity),
        ];
        let term = |symbol: &str, exponent: f64| {
            if exponent == 1.0 {
                symbol.to_string()
            } else {
                format!("{}^{}", symbol, exponent)
            }
        };
        let numerator: Vec<String> = dims
            .iter()
            .filter(|(_, e)| *e > 0.0)
            .map(|(s, e)| term(s, *e))
            .collect();
        let denominator: Vec<String> = dims
            .iter()
            .filter(|(_, e)| *e < 0.0)
            .map(|(s, e)| term(s, -*e))
            .collect();
        if self.factor != 1.0 {
            write!(f, "{} ", self.factor)?;
        }
        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", numerator.join(" "))?;
        }
        for d in denominator {
            write!(f, "/{}", d)?;
        }
        Ok(())
    }
}

fn lookup_unit(symbol: &str) -> Option<Units> {
    let mass = |f| Units::base(f, 1.0, 0.0, 0.0, 0.0, 0.0);
    let length = |f| Units::base(f, 0.0, 1.0, 0.0, 0.0, 0.0);
    let time = |f| Units::base(f, 0.0, 0.0, 1.0, 0.0, 0.0);
    let quantity = |f| Units::base(f, 0.0, 0.0, 0.0, 0.0, 1.0);
    let energy = |f| Units::base(f, 1.0, 2.0, -2.0, 0.0, 0.0);
    let pressure = |f| Units::base(f, 1.0, -1.0, -2.0, 0.0, 0.0);
    let units = match symbol {
        "kg" => mass(1.0),
        "g" => mass(1e-3),
        "m" => length(1.0),
        "cm" => length(1e-2),
        "mm" => length(1e-3),
        "km" => length(1e3),
        "Angstrom" | "angstrom" => length(1e-10),
        "L" | "l" => length(0.1).pow(3.0),
        "s" => time(1.0),
        "ms" => time(1e-3),
        "us" => time(1e-6),
        "min" => time(60.0),
        "hr" | "h" => time(3600.0),
        "K" => Units::temperature(),
        "kmol" => quantity(1.0),
        "mol" => quantity(1e-3),
        "molec" | "molecule" => quantity(1.0 / AVOGADRO),
        "J" => energy(1.0),
        "kJ" => energy(1e3),
        "MJ" => energy(1e6),
        "cal" => energy(4.184),
        "kcal" => energy(4184.0),
        "eV" => energy(1.602176634e-19),
        "erg" => energy(1e-7),
        "Pa" => pressure(1.0),
        "kPa" => pressure(1e3),
        "MPa" => pressure(1e6),
        "bar" => pressure(1e5),
        "atm" => pressure(ONE_ATM),
        "torr" | "Torr" => pressure(ONE_ATM / 760.0),
        _ => return None,
    };
    Some(units)
}

/// Converts an activation energy given in `units` to J/kmol. Temperature units are
/// read as `E/R`, energy units without quantity as energy per molecule.
pub fn activation_energy_to_si(value: f64, units: &Units) -> Result<f64, RateError> {
    Ok(value * units.factor() * activation_energy_scale(units)?)
}

/// Inverse of [`activation_energy_to_si`].
pub fn activation_energy_from_si(value: f64, units: &Units) -> Result<f64, RateError> {
    Ok(value / (units.factor() * activation_energy_scale(units)?))
}

fn activation_energy_scale(units: &Units) -> Result<f64, RateError> {
    if units.same_dimensions(&Units::molar_energy()) {
        Ok(1.0)
    } else if units.same_dimensions(&Units::temperature()) {
        Ok(GAS_CONSTANT)
    } else if units.same_dimensions(&Units::energy()) {
        Ok(AVOGADRO)
    } else {
        Err(RateError::config(format!(
            "Units '{}' are not valid for an activation energy",
            units
        )))
    }
}

/// The `units` directive of a configuration map, e.g.
/// `{"length": "cm", "quantity": "mol", "activation-energy": "cal/mol"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitDirective {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<String>,
    #[serde(
        rename = "activation-energy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub activation_energy: Option<String>,
}

impl UnitDirective {
    /// fields set in `other` take precedence
    pub fn overridden_by(&self, other: &UnitDirective) -> UnitDirective {
        let pick = |a: &Option<String>, b: &Option<String>| b.clone().or_else(|| a.clone());
        UnitDirective {
            mass: pick(&self.mass, &other.mass),
            length: pick(&self.length, &other.length),
            time: pick(&self.time, &other.time),
            temperature: pick(&self.temperature, &other.temperature),
            quantity: pick(&self.quantity, &other.quantity),
            energy: pick(&self.energy, &other.energy),
            pressure: pick(&self.pressure, &other.pressure),
            activation_energy: pick(&self.activation_energy, &other.activation_energy),
        }
    }
}

/// Default units in which bare numbers of a configuration map are given.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSystem {
    directive: UnitDirective,
    mass: f64,
    length: f64,
    time: f64,
    temperature: f64,
    quantity: f64,
    energy: Option<f64>,
    pressure: Option<f64>,
    activation_energy: Units,
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self {
            directive: UnitDirective::default(),
            mass: 1.0,
            length: 1.0,
            time: 1.0,
            temperature: 1.0,
            quantity: 1.0,
            energy: None,
            pressure: None,
            activation_energy: Units::molar_energy(),
        }
    }
}

impl UnitSystem {
    pub fn from_directive(directive: UnitDirective) -> Result<Self, RateError> {
        fn checked(
            units: &Option<String>,
            expected: Units,
            what: &str,
        ) -> Result<Option<f64>, RateError> {
            match units {
                None => Ok(None),
                Some(s) => {
                    let parsed = Units::parse(s)?;
                    if !parsed.same_dimensions(&expected) {
                        return Err(RateError::config(format!(
                            "'{}' is not a unit of {}",
                            s, what
                        )));
                    }
                    Ok(Some(parsed.factor()))
                }
            }
        }
        let mut system = UnitSystem::default();
        let mass = Units::base(1.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let length = Units::base(1.0, 0.0, 1.0, 0.0, 0.0, 0.0);
        let time = Units::base(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        let quantity = Units::base(1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        if let Some(f) = checked(&directive.mass, mass, "mass")? {
            system.mass = f;
        }
        if let Some(f) = checked(&directive.length, length, "length")? {
            system.length = f;
        }
        if let Some(f) = checked(&directive.time, time, "time")? {
            system.time = f;
        }
        if let Some(f) = checked(&directive.temperature, Units::temperature(), "temperature")? {
            system.temperature = f;
        }
        if let Some(f) = checked(&directive.quantity, quantity, "quantity")? {
            system.quantity = f;
        }
        system.energy = checked(&directive.energy, Units::energy(), "energy")?;
        system.pressure = checked(&directive.pressure, Units::pressure(), "pressure")?;
        system.activation_energy = match &directive.activation_energy {
            Some(s) => {
                let parsed = Units::parse(s)?;
                activation_energy_scale(&parsed)?;
                parsed
            }
            None => {
                let energy = system
                    .energy
                    .unwrap_or(system.mass * system.length.powi(2) / system.time.powi(2));
                let mut molar = Units::molar_energy();
                molar.factor = energy / system.quantity;
                molar
            }
        };
        system.directive = directive;
        Ok(system)
    }

    /// Parses a `units` directive given as a JSON object.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, RateError> {
        let directive: UnitDirective = serde_json::from_value(value.clone())
            .map_err(|e| RateError::config(format!("Invalid units directive: {}", e)))?;
        UnitSystem::from_directive(directive)
    }

    /// this system with the entries of a nested directive applied on top
    pub fn extended(&self, directive: &UnitDirective) -> Result<Self, RateError> {
        UnitSystem::from_directive(self.directive.overridden_by(directive))
    }

    pub fn directive(&self) -> &UnitDirective {
        &self.directive
    }
    pub fn is_default(&self) -> bool {
        self.directive == UnitDirective::default()
    }

    /// SI value of one unit of this system having the dimensions of `units`
    pub fn factor_for(&self, units: &Units) -> f64 {
        if let Some(p) = self.pressure {
            if units.same_dimensions(&Units::pressure()) {
                return p;
            }
        }
        if let Some(e) = self.energy {
            if units.same_dimensions(&Units::energy()) {
                return e;
            }
        }
        self.mass.powf(units.mass)
            * self.length.powf(units.length)
            * self.time.powf(units.time)
            * self.temperature.powf(units.temperature)
            * self.quantity.powf(units.quantity)
    }
    pub fn to_si(&self, value: f64, units: &Units) -> f64 {
        value * self.factor_for(units)
    }
    pub fn from_si(&self, value: f64, units: &Units) -> f64 {
        value / self.factor_for(units)
    }
    /// activation energy given in this system's units, to J/kmol
    pub fn activation_energy_to_si(&self, value: f64) -> Result<f64, RateError> {
        activation_energy_to_si(value, &self.activation_energy)
    }
    /// activation energy in J/kmol, expressed in this system's units
    pub fn activation_energy_from_si(&self, value: f64) -> Result<f64, RateError> {
        activation_energy_from_si(value, &self.activation_energy)
    }
}

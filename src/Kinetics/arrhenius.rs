//! Modified Arrhenius rate law k = A T^b exp(-Ea/(R T)).
//!
//! The three parameters are kept in SI units (A in kmol, m, s; Ea as Ea/R in K).
//! Configuration forms accepted under `rate-constant`:
//! ```json
//! {"rate-constant": {"A": 3.87e4, "b": 2.7, "Ea": 6260.0}}
//! {"rate-constant": {"A": 3.87e4, "b": 2.7, "Ea": "26.2 kJ/mol", "units": "cm^3/mol/s"}}
//! {"rate-constant": [3.87e4, 2.7, 6260.0]}
//! ```
use crate::Kinetics::config_map::{ConfigMap, ConversionKind, get_float};
use crate::Kinetics::multi_rate::{BatchRate, RateLink};
use crate::Kinetics::rate_api::{RateKind, RateLaw};
use crate::Kinetics::rate_data::{ArrheniusData, RateData};
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::{GAS_CONSTANT, Units};
use log::debug;
use serde_json::{Map, Value};

/// Parameters of one Arrhenius expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrhenius {
    a: f64,
    b: f64,
    /// activation energy divided by the gas constant, K
    ea_r: f64,
}

impl Default for Arrhenius {
    fn default() -> Self {
        Arrhenius::unconfigured()
    }
}

impl Arrhenius {
    /// `ea` is the activation energy in J/kmol
    pub fn new(a: f64, b: f64, ea: f64) -> Self {
        Self {
            a,
            b,
            ea_r: ea / GAS_CONSTANT,
        }
    }
    /// NaN parameters; evaluates to NaN
    pub fn unconfigured() -> Self {
        Self {
            a: f64::NAN,
            b: f64::NAN,
            ea_r: f64::NAN,
        }
    }
    pub fn is_configured(&self) -> bool {
        !(self.a.is_nan() || self.b.is_nan() || self.ea_r.is_nan())
    }
    pub fn pre_exponential_factor(&self) -> f64 {
        self.a
    }
    pub fn temperature_exponent(&self) -> f64 {
        self.b
    }
    /// J/kmol
    pub fn activation_energy(&self) -> f64 {
        self.ea_r * GAS_CONSTANT
    }
    pub fn activation_energy_r(&self) -> f64 {
        self.ea_r
    }

    /// rate constant from precomputed ln(T) and 1/T
    pub fn eval(&self, log_t: f64, recip_t: f64) -> f64 {
        if self.b == 0.0 && self.ea_r == 0.0 {
            return self.a;
        }
        self.a * (self.b * log_t - self.ea_r * recip_t).exp()
    }
    pub fn eval_t(&self, temperature: f64) -> f64 {
        self.eval(temperature.ln(), 1.0 / temperature)
    }

    /// Reads the expression stored under `key`, either as a map with `A`, `b`, `Ea`
    /// (and optionally the units of `A`) or as a list `[A, b, Ea]`.
    pub fn from_key(node: &ConfigMap, key: &str, rate_units: &Units) -> Result<Self, RateError> {
        match node.at(key)? {
            Value::Array(items) => {
                if items.len() != 3 {
                    return Err(RateError::config(format!(
                        "'{}' should be a list [A, b, Ea], found {} entries",
                        key,
                        items.len()
                    )));
                }
                let a = node.convert_value(&items[0], rate_units)?;
                let b = node.convert_value(&items[1], &Units::new(1.0))?;
                let ea = node.convert_activation_energy_value(&items[2])?;
                Ok(Arrhenius::new(a, b, ea))
            }
            Value::Object(_) => Arrhenius::from_config(&node.get_map(key)?, rate_units),
            other => Err(RateError::config(format!(
                "'{}' should be a map or a list, found '{}'",
                key, other
            ))),
        }
    }

    /// Reads `A`, `b` and `Ea` from a map. A `units` string in the map gives the units of `A`.
    pub fn from_config(block: &ConfigMap, rate_units: &Units) -> Result<Self, RateError> {
        let a = match block.get_str("units")? {
            Some(a_units) => {
                let given = Units::parse(a_units)?;
                if !rate_units.is_dimensionless() && !given.same_dimensions(rate_units) {
                    return Err(RateError::config(format!(
                        "Units '{}' of the pre-exponential factor are incompatible with '{}'",
                        a_units, rate_units
                    )));
                }
                get_float(block, "A", ConversionKind::NoConversion)? * given.factor()
            }
            None => block.convert("A", rate_units)?,
        };
        let b = get_float(block, "b", ConversionKind::NoConversion)?;
        let ea = block.convert_activation_energy("Ea")?;
        Ok(Arrhenius::new(a, b, ea))
    }

    /// Writes `{"A", "b", "Ea"}` under `key`, in the unit system of `out`.
    pub fn to_config(&self, out: &mut ConfigMap, key: &str, rate_units: &Units) -> Result<(), RateError> {
        let block = self.to_value(out, rate_units)?;
        out.insert(key, block);
        Ok(())
    }

    pub(crate) fn to_value(&self, out: &ConfigMap, rate_units: &Units) -> Result<Value, RateError> {
        let units = out.units();
        let mut block = Map::new();
        block.insert("A".to_string(), units.from_si(self.a, rate_units).into());
        block.insert("b".to_string(), self.b.into());
        block.insert(
            "Ea".to_string(),
            units.activation_energy_from_si(self.activation_energy())?.into(),
        );
        Ok(Value::Object(block))
    }
}

/// Update message of a linked [`ArrheniusRate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrheniusUpdate {
    PreExponentialFactor(f64),
    TemperatureExponent(f64),
    /// Ea/R, K
    ActivationEnergyR(f64),
    Replace(Arrhenius),
}

#[derive(Debug, Clone, Default)]
pub struct ArrheniusRate {
    arrhenius: Arrhenius,
    allow_negative_a: bool,
    units: Units,
    input: ConfigMap,
    link: RateLink<ArrheniusUpdate>,
}

impl ArrheniusRate {
    /// `ea` is the activation energy in J/kmol
    pub fn new(a: f64, b: f64, ea: f64) -> Self {
        Self::from_arrhenius(Arrhenius::new(a, b, ea))
    }
    pub fn from_arrhenius(arrhenius: Arrhenius) -> Self {
        Self {
            arrhenius,
            ..Default::default()
        }
    }
    pub fn from_config(node: &ConfigMap, rate_units: &Units) -> Result<Self, RateError> {
        let mut rate = ArrheniusRate::default();
        rate.set_parameters(node, rate_units)?;
        Ok(rate)
    }

    pub fn arrhenius(&self) -> &Arrhenius {
        &self.arrhenius
    }
    pub fn pre_exponential_factor(&self) -> f64 {
        self.arrhenius.a
    }
    pub fn temperature_exponent(&self) -> f64 {
        self.arrhenius.b
    }
    /// J/kmol
    pub fn activation_energy(&self) -> f64 {
        self.arrhenius.activation_energy()
    }
    pub fn allow_negative_pre_exponential_factor(&self) -> bool {
        self.allow_negative_a
    }
    pub fn set_allow_negative_pre_exponential_factor(&mut self, allow: bool) {
        self.allow_negative_a = allow;
    }

    pub fn set_pre_exponential_factor(&mut self, a: f64) {
        self.apply(ArrheniusUpdate::PreExponentialFactor(a));
    }
    pub fn set_temperature_exponent(&mut self, b: f64) {
        self.apply(ArrheniusUpdate::TemperatureExponent(b));
    }
    /// `ea` in J/kmol
    pub fn set_activation_energy(&mut self, ea: f64) {
        self.apply(ArrheniusUpdate::ActivationEnergyR(ea / GAS_CONSTANT));
    }

    fn apply(&mut self, update: ArrheniusUpdate) {
        self.apply_update(update.clone());
        self.link.propagate(update);
    }
}

impl RateLaw for ArrheniusRate {
    fn kind(&self) -> RateKind {
        RateKind::Arrhenius
    }
    fn set_parameters(&mut self, node: &ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        let allow_negative_a = node.get_bool("negative-A", false)?;
        let arrhenius = if node.has_key("rate-constant") {
            Arrhenius::from_key(node, "rate-constant", rate_units)?
        } else {
            debug!("no rate-constant given, Arrhenius rate left unconfigured");
            Arrhenius::unconfigured()
        };
        self.units = *rate_units;
        self.input = node.clone();
        self.allow_negative_a = allow_negative_a;
        self.apply(ArrheniusUpdate::Replace(arrhenius));
        Ok(())
    }
    fn get_parameters(&self, out: &mut ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        if self.allow_negative_a {
            out.insert("negative-A", true);
        }
        if self.arrhenius.is_configured() {
            self.arrhenius.to_config(out, "rate-constant", rate_units)?;
        }
        Ok(())
    }
    fn validate(&self, equation: &str) -> Result<(), RateError> {
        if !self.allow_negative_a && self.arrhenius.a < 0.0 {
            return Err(RateError::Validation {
                equation: equation.to_string(),
                message: "Undeclared negative pre-exponential factor found".to_string(),
            });
        }
        Ok(())
    }
    fn eval_at(&self, temperature: f64, pressure: f64) -> f64 {
        self.eval(&ArrheniusData::at(temperature, pressure))
    }
    fn index(&self) -> Result<usize, RateError> {
        self.link.index()
    }
    fn is_linked(&self) -> bool {
        self.link.is_linked()
    }
    fn units(&self) -> &Units {
        &self.units
    }
    fn input(&self) -> &ConfigMap {
        &self.input
    }
}

impl BatchRate for ArrheniusRate {
    type Data = ArrheniusData;
    type Update = ArrheniusUpdate;
    const KIND: RateKind = RateKind::Arrhenius;

    fn eval(&self, data: &ArrheniusData) -> f64 {
        self.arrhenius.eval(data.log_t, data.recip_t)
    }
    fn apply_update(&mut self, update: ArrheniusUpdate) {
        match update {
            ArrheniusUpdate::PreExponentialFactor(a) => self.arrhenius.a = a,
            ArrheniusUpdate::TemperatureExponent(b) => self.arrhenius.b = b,
            ArrheniusUpdate::ActivationEnergyR(ea_r) => self.arrhenius.ea_r = ea_r,
            ArrheniusUpdate::Replace(arrhenius) => self.arrhenius = arrhenius,
        }
    }
    fn rate_link(&self) -> &RateLink<ArrheniusUpdate> {
        &self.link
    }
    fn rate_link_mut(&mut self) -> &mut RateLink<ArrheniusUpdate> {
        &mut self.link
    }
}

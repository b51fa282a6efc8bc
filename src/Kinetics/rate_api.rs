use crate::Kinetics::arrhenius::ArrheniusRate;
use crate::Kinetics::chebyshev::ChebyshevRate;
use crate::Kinetics::config_map::ConfigMap;
use crate::Kinetics::custom_rate::CustomFuncRate;
use crate::Kinetics::plog::PlogRate;
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::{UnitSystem, Units};
use enum_dispatch::enum_dispatch;
use std::fmt;
use std::str::FromStr;

/// kind of rate law, named as in the `type` field of configuration maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKind {
    Arrhenius,
    PressureDependentArrhenius,
    Chebyshev,
    CustomFunction,
}

impl RateKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            RateKind::Arrhenius => "Arrhenius",
            RateKind::PressureDependentArrhenius => "pressure-dependent-Arrhenius",
            RateKind::Chebyshev => "Chebyshev",
            RateKind::CustomFunction => "custom-rate-function",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for RateKind {
    type Err = RateError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Arrhenius" | "elementary" => Ok(RateKind::Arrhenius),
            "pressure-dependent-Arrhenius" | "plog" | "PLOG" => {
                Ok(RateKind::PressureDependentArrhenius)
            }
            "Chebyshev" | "chebyshev" => Ok(RateKind::Chebyshev),
            "custom-rate-function" => Ok(RateKind::CustomFunction),
            other => Err(RateError::config(format!("Unknown rate type '{}'", other))),
        }
    }
}

/// Front-end interface of every rate law: configuration codec, validation and
/// evaluation of a single reaction.
#[enum_dispatch]
pub trait RateLaw {
    fn kind(&self) -> RateKind;
    /// Reads the parameters from `node`; bare numbers are in the unit system of `node`
    /// and the rate constant has the dimensions of `rate_units`. A missing rate
    /// definition leaves the rate unconfigured.
    fn set_parameters(&mut self, node: &ConfigMap, rate_units: &Units) -> Result<(), RateError>;
    /// Writes the parameters into `out`, expressed in the unit system of `out`.
    fn get_parameters(&self, out: &mut ConfigMap, rate_units: &Units) -> Result<(), RateError>;
    fn validate(&self, equation: &str) -> Result<(), RateError>;
    /// rate constant at temperature (K) and pressure (Pa)
    fn eval_at(&self, temperature: f64, pressure: f64) -> f64;
    /// slot of the rate in its evaluator
    fn index(&self) -> Result<usize, RateError>;
    fn is_linked(&self) -> bool;
    /// units of the rate constant given at construction
    fn units(&self) -> &Units;
    /// configuration the rate was built from
    fn input(&self) -> &ConfigMap;
    /// parameters in the unit system of the input map
    fn parameters(&self) -> Result<ConfigMap, RateError> {
        let mut out = ConfigMap::with_units(self.input().units().clone());
        self.get_parameters(&mut out, self.units())?;
        Ok(out)
    }
}

#[derive(Debug, Clone)]
#[enum_dispatch(RateLaw)]
pub enum ReactionRate {
    Arrhenius(ArrheniusRate),
    Plog(PlogRate),
    Chebyshev(ChebyshevRate),
    Custom(CustomFuncRate),
}

impl ReactionRate {
    /// parameters with a leading `type` field, readable by [`create_rate`]
    pub fn to_config(&self, units: &UnitSystem) -> Result<ConfigMap, RateError> {
        let mut out = ConfigMap::with_units(units.clone());
        if self.kind() != RateKind::Arrhenius {
            out.insert("type", self.kind().type_name());
        }
        self.get_parameters(&mut out, self.units())?;
        Ok(out)
    }
}

/// Builds the rate law named by the `type` field of `node` (Arrhenius if absent).
pub fn create_rate(node: &ConfigMap, rate_units: &Units) -> Result<ReactionRate, RateError> {
    let kind = match node.get_str("type")? {
        None => RateKind::Arrhenius,
        Some(name) => name.parse()?,
    };
    let rate = match kind {
        RateKind::Arrhenius => ArrheniusRate::from_config(node, rate_units)?.into(),
        RateKind::PressureDependentArrhenius => PlogRate::from_config(node, rate_units)?.into(),
        RateKind::Chebyshev => ChebyshevRate::from_config(node, rate_units)?.into(),
        RateKind::CustomFunction => {
            return Err(RateError::config(
                "custom rate functions cannot be created from configuration data",
            ));
        }
    };
    Ok(rate)
}

pub fn create_rate_by_name(name: &str) -> Result<ReactionRate, RateError> {
    let rate = match name.parse::<RateKind>()? {
        RateKind::Arrhenius => ArrheniusRate::default().into(),
        RateKind::PressureDependentArrhenius => PlogRate::default().into(),
        RateKind::Chebyshev => ChebyshevRate::default().into(),
        RateKind::CustomFunction => CustomFuncRate::default().into(),
    };
    Ok(rate)
}

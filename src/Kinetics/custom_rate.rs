//! Rate law given by a user-supplied function of temperature.
//! It has no configuration form: only units and input are recorded from a map.
use crate::Kinetics::config_map::ConfigMap;
use crate::Kinetics::multi_rate::{BatchRate, RateLink};
use crate::Kinetics::rate_api::{RateKind, RateLaw};
use crate::Kinetics::rate_data::{CustomData, RateData};
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::Units;
use std::fmt;
use std::sync::Arc;

/// k(T), T in K
pub type RateFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

#[derive(Clone)]
pub enum CustomUpdate {
    RateFunction(Option<RateFunction>),
}

impl fmt::Debug for CustomUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CustomUpdate::RateFunction(Some(_)) => write!(f, "RateFunction(<fn>)"),
            CustomUpdate::RateFunction(None) => write!(f, "RateFunction(None)"),
        }
    }
}

#[derive(Clone, Default)]
pub struct CustomFuncRate {
    function: Option<RateFunction>,
    units: Units,
    input: ConfigMap,
    link: RateLink<CustomUpdate>,
}

impl fmt::Debug for CustomFuncRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CustomFuncRate")
            .field("function", &self.function.as_ref().map(|_| "<fn>"))
            .field("units", &self.units)
            .field("link", &self.link)
            .finish()
    }
}

impl CustomFuncRate {
    pub fn with_function(function: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            function: Some(Arc::new(function)),
            ..Default::default()
        }
    }
    pub fn from_config(node: &ConfigMap, rate_units: &Units) -> Result<Self, RateError> {
        let mut rate = CustomFuncRate::default();
        rate.set_parameters(node, rate_units)?;
        Ok(rate)
    }
    pub fn has_function(&self) -> bool {
        self.function.is_some()
    }
    /// Replaces the function here and in the linked evaluator; `None` clears it.
    pub fn set_rate_function(&mut self, function: Option<RateFunction>) {
        self.function = function.clone();
        self.link.propagate(CustomUpdate::RateFunction(function));
    }
}

impl RateLaw for CustomFuncRate {
    fn kind(&self) -> RateKind {
        RateKind::CustomFunction
    }
    fn set_parameters(&mut self, node: &ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        self.units = *rate_units;
        self.input = node.clone();
        Ok(())
    }
    fn get_parameters(&self, _out: &mut ConfigMap, _rate_units: &Units) -> Result<(), RateError> {
        Err(RateError::config(
            "custom rate functions cannot be serialized to configuration data",
        ))
    }
    fn validate(&self, _equation: &str) -> Result<(), RateError> {
        Ok(())
    }
    fn eval_at(&self, temperature: f64, pressure: f64) -> f64 {
        self.eval(&CustomData::at(temperature, pressure))
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

impl BatchRate for CustomFuncRate {
    type Data = CustomData;
    type Update = CustomUpdate;
    const KIND: RateKind = RateKind::CustomFunction;

    fn eval(&self, data: &CustomData) -> f64 {
        match &self.function {
            Some(function) => function(data.temperature),
            None => f64::NAN,
        }
    }
    fn apply_update(&mut self, update: CustomUpdate) {
        match update {
            CustomUpdate::RateFunction(function) => self.function = function,
        }
    }
    fn rate_link(&self) -> &RateLink<CustomUpdate> {
        &self.link
    }
    fn rate_link_mut(&mut self) -> &mut RateLink<CustomUpdate> {
        &mut self.link
    }
}

//! Per-condition data shared by all rate laws of one kind during a batch
//! evaluation: powers and logarithms of temperature and pressure are computed
//! once per pass instead of once per reaction.
use std::fmt::Debug;

pub trait RateData: Clone + Debug {
    /// state before the first update; every field is NaN
    fn empty() -> Self;
    /// refreshes the cached quantities, returns false if the conditions did not change
    fn update(&mut self, temperature: f64, pressure: f64) -> bool;
    fn temperature(&self) -> f64;
    fn at(temperature: f64, pressure: f64) -> Self
    where
        Self: Sized,
    {
        let mut data = Self::empty();
        data.update(temperature, pressure);
        data
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrheniusData {
    pub temperature: f64,
    pub log_t: f64,
    pub recip_t: f64,
}

impl RateData for ArrheniusData {
    fn empty() -> Self {
        Self {
            temperature: f64::NAN,
            log_t: f64::NAN,
            recip_t: f64::NAN,
        }
    }
    fn update(&mut self, temperature: f64, _pressure: f64) -> bool {
        if temperature == self.temperature {
            return false;
        }
        self.temperature = temperature;
        self.log_t = temperature.ln();
        self.recip_t = 1.0 / temperature;
        true
    }
    fn temperature(&self) -> f64 {
        self.temperature
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlogData {
    pub temperature: f64,
    pub log_t: f64,
    pub recip_t: f64,
    pub pressure: f64,
    /// natural logarithm of pressure
    pub log_p: f64,
}

impl RateData for PlogData {
    fn empty() -> Self {
        Self {
            temperature: f64::NAN,
            log_t: f64::NAN,
            recip_t: f64::NAN,
            pressure: f64::NAN,
            log_p: f64::NAN,
        }
    }
    fn update(&mut self, temperature: f64, pressure: f64) -> bool {
        let mut changed = false;
        if temperature != self.temperature {
            self.temperature = temperature;
            self.log_t = temperature.ln();
            self.recip_t = 1.0 / temperature;
            changed = true;
        }
        if pressure != self.pressure {
            self.pressure = pressure;
            self.log_p = pressure.ln();
            changed = true;
        }
        changed
    }
    fn temperature(&self) -> f64 {
        self.temperature
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevData {
    pub temperature: f64,
    pub recip_t: f64,
    pub pressure: f64,
    pub log10_p: f64,
}

impl RateData for ChebyshevData {
    fn empty() -> Self {
        Self {
            temperature: f64::NAN,
            recip_t: f64::NAN,
            pressure: f64::NAN,
            log10_p: f64::NAN,
        }
    }
    fn update(&mut self, temperature: f64, pressure: f64) -> bool {
        let mut changed = false;
        if temperature != self.temperature {
            self.temperature = temperature;
            self.recip_t = 1.0 / temperature;
            changed = true;
        }
        if pressure != self.pressure {
            self.pressure = pressure;
            self.log10_p = pressure.log10();
            changed = true;
        }
        changed
    }
    fn temperature(&self) -> f64 {
        self.temperature
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomData {
    pub temperature: f64,
}

impl RateData for CustomData {
    fn empty() -> Self {
        Self {
            temperature: f64::NAN,
        }
    }
    fn update(&mut self, temperature: f64, _pressure: f64) -> bool {
        if temperature == self.temperature {
            return false;
        }
        self.temperature = temperature;
        true
    }
    fn temperature(&self) -> f64 {
        self.temperature
    }
}

//! Pressure-dependent Arrhenius rate law (PLOG): Arrhenius expressions given at a
//! set of pressures, interpolated linearly in ln(k) against ln(P).
//!
//! ```json
//! {"type": "pressure-dependent-Arrhenius",
//!  "rate-constants": [{"P": "0.01 atm", "A": 1.2124e16, "b": -0.5779, "Ea": 10872.7},
//!                     {"P": "1.0 atm", "A": 4.9108e31, "b": -4.8507, "Ea": 24772.8}]}
//! ```
//! Several expressions at the same pressure are summed. Outside the pressure range
//! the rate is evaluated at the nearest pressure.
use crate::Kinetics::arrhenius::Arrhenius;
use crate::Kinetics::config_map::ConfigMap;
use crate::Kinetics::multi_rate::{BatchRate, RateLink};
use crate::Kinetics::rate_api::{RateKind, RateLaw};
use crate::Kinetics::rate_data::{PlogData, RateData};
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::Units;
use log::{debug, warn};
use serde_json::Value;
use std::ops::Range;

/// temperatures at which the summed rate of every pressure must be positive
const VALIDATION_TEMPERATURES: [f64; 5] = [200.0, 500.0, 1000.0, 2000.0, 5000.0];

/// Update message of a linked [`PlogRate`]: the full, sorted table of expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum PlogUpdate {
    Rates(Vec<(f64, Arrhenius)>),
}

#[derive(Debug, Clone, Default)]
pub struct PlogRate {
    /// (pressure in Pa, expression), sorted by pressure
    rates: Vec<(f64, Arrhenius)>,
    /// ln P of each distinct pressure
    log_pressures: Vec<f64>,
    /// expressions belonging to each distinct pressure
    ranges: Vec<Range<usize>>,
    units: Units,
    input: ConfigMap,
    link: RateLink<PlogUpdate>,
}

impl PlogRate {
    pub fn new(rates: Vec<(f64, Arrhenius)>) -> Self {
        let mut plog = PlogRate::default();
        plog.set_rates(rates);
        plog
    }
    pub fn from_config(node: &ConfigMap, rate_units: &Units) -> Result<Self, RateError> {
        let mut rate = PlogRate::default();
        rate.set_parameters(node, rate_units)?;
        Ok(rate)
    }

    /// expressions sorted by pressure
    pub fn rates(&self) -> &[(f64, Arrhenius)] {
        &self.rates
    }
    /// distinct pressures in Pa, ascending
    pub fn pressures(&self) -> Vec<f64> {
        self.log_pressures.iter().map(|lp| lp.exp()).collect()
    }

    /// Replaces the whole table. Entries are sorted by pressure, keeping the
    /// given order among entries of equal pressure.
    pub fn set_rates(&mut self, mut rates: Vec<(f64, Arrhenius)>) {
        if rates.windows(2).any(|w| w[0].0 > w[1].0) {
            warn!("PLOG pressures are not in ascending order, sorting {} entries", rates.len());
            rates.sort_by(|x, y| x.0.total_cmp(&y.0));
        }
        self.link.propagate(PlogUpdate::Rates(rates.clone()));
        self.apply_update(PlogUpdate::Rates(rates));
    }

    fn rebuild(&mut self, rates: Vec<(f64, Arrhenius)>) {
        self.log_pressures.clear();
        self.ranges.clear();
        let mut start = 0;
        for i in 1..=rates.len() {
            if i == rates.len() || rates[i].0 != rates[start].0 {
                self.log_pressures.push(rates[start].0.ln());
                self.ranges.push(start..i);
                start = i;
            }
        }
        self.rates = rates;
    }

    /// summed rate of the expressions at the `group`-th distinct pressure
    fn group_rate(&self, group: usize, log_t: f64, recip_t: f64) -> f64 {
        self.rates[self.ranges[group].clone()]
            .iter()
            .map(|(_, arrhenius)| arrhenius.eval(log_t, recip_t))
            .sum()
    }
}

impl RateLaw for PlogRate {
    fn kind(&self) -> RateKind {
        RateKind::PressureDependentArrhenius
    }
    fn set_parameters(&mut self, node: &ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        let mut rates = Vec::new();
        if node.has_key("rate-constants") {
            for item in node.get_map_list("rate-constants")? {
                let pressure = item.convert("P", &Units::pressure())?;
                rates.push((pressure, Arrhenius::from_config(&item, rate_units)?));
            }
        } else {
            debug!("no rate-constants given, PLOG rate left unconfigured");
        }
        self.units = *rate_units;
        self.input = node.clone();
        self.set_rates(rates);
        Ok(())
    }
    fn get_parameters(&self, out: &mut ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        if self.rates.is_empty() {
            return Ok(());
        }
        let mut items = Vec::with_capacity(self.rates.len());
        for (pressure, arrhenius) in &self.rates {
            let mut item = serde_json::Map::new();
            item.insert(
                "P".to_string(),
                out.units().from_si(*pressure, &Units::pressure()).into(),
            );
            if let Value::Object(block) = arrhenius.to_value(out, rate_units)? {
                item.extend(block);
            }
            items.push(Value::Object(item));
        }
        out.insert("rate-constants", Value::Array(items));
        Ok(())
    }
    fn validate(&self, equation: &str) -> Result<(), RateError> {
        let invalid = |message: String| RateError::Validation {
            equation: equation.to_string(),
            message,
        };
        for (pressure, _) in &self.rates {
            if !(pressure.is_finite() && *pressure > 0.0) {
                return Err(invalid(format!("Invalid pressure {} Pa", pressure)));
            }
        }
        for (group, log_p) in self.log_pressures.iter().enumerate() {
            for t in VALIDATION_TEMPERATURES {
                let k = self.group_rate(group, t.ln(), 1.0 / t);
                // also rejects NaN
                if !(k > 0.0) {
                    return Err(invalid(format!(
                        "Non-positive rate {} at P = {} Pa and T = {} K",
                        k,
                        log_p.exp(),
                        t
                    )));
                }
            }
        }
        Ok(())
    }
    fn eval_at(&self, temperature: f64, pressure: f64) -> f64 {
        self.eval(&PlogData::at(temperature, pressure))
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

impl BatchRate for PlogRate {
    type Data = PlogData;
    type Update = PlogUpdate;
    const KIND: RateKind = RateKind::PressureDependentArrhenius;

    fn eval(&self, data: &PlogData) -> f64 {
        let n = self.log_pressures.len();
        if n == 0 || data.log_p.is_nan() {
            return f64::NAN;
        }
        let (log_t, recip_t, log_p) = (data.log_t, data.recip_t, data.log_p);
        if log_p <= self.log_pressures[0] {
            return self.group_rate(0, log_t, recip_t);
        }
        if log_p >= self.log_pressures[n - 1] {
            return self.group_rate(n - 1, log_t, recip_t);
        }
        match self
            .log_pressures
            .binary_search_by(|lp| lp.total_cmp(&log_p))
        {
            Ok(i) => self.group_rate(i, log_t, recip_t),
            Err(i) => {
                let (lp1, lp2) = (self.log_pressures[i - 1], self.log_pressures[i]);
                let ln_k1 = self.group_rate(i - 1, log_t, recip_t).ln();
                let ln_k2 = self.group_rate(i, log_t, recip_t).ln();
                (ln_k1 + (ln_k2 - ln_k1) * (log_p - lp1) / (lp2 - lp1)).exp()
            }
        }
    }
    fn apply_update(&mut self, update: PlogUpdate) {
        match update {
            PlogUpdate::Rates(rates) => self.rebuild(rates),
        }
    }
    fn rate_link(&self) -> &RateLink<PlogUpdate> {
        &self.link
    }
    fn rate_link_mut(&mut self) -> &mut RateLink<PlogUpdate> {
        &mut self.link
    }
}

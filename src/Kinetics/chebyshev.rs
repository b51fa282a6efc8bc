//! Chebyshev rate law: log10(k) is a double Chebyshev series in reduced inverse
//! temperature and reduced log10 pressure.
//!
//! ```json
//! {"type": "Chebyshev",
//!  "temperature-range": [290.0, 3000.0],
//!  "pressure-range": ["0.0098692 atm", "98.692 atm"],
//!  "data": [[8.2883, -1.1397, -0.12059, 0.016034],
//!           [1.9764, 1.0037, 7.2865e-03, -0.030432]]}
//! ```
//! Rows of `data` correspond to temperature order, columns to pressure order. The
//! first coefficient absorbs the units of the rate constant.
use crate::Kinetics::config_map::ConfigMap;
use crate::Kinetics::multi_rate::{BatchRate, RateLink};
use crate::Kinetics::rate_api::{RateKind, RateLaw};
use crate::Kinetics::rate_data::{ChebyshevData, RateData};
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::Units;
use log::debug;
use nalgebra::DMatrix;
use serde_json::Value;

/// Update message of a linked [`ChebyshevRate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChebyshevUpdate {
    Coeffs(DMatrix<f64>),
    Limits {
        tmin: f64,
        tmax: f64,
        pmin: f64,
        pmax: f64,
    },
}

#[derive(Debug, Clone)]
pub struct ChebyshevRate {
    tmin: f64,
    tmax: f64,
    pmin: f64,
    pmax: f64,
    /// coefficients for k in SI units, rows = temperature order
    coeffs: DMatrix<f64>,
    units: Units,
    input: ConfigMap,
    link: RateLink<ChebyshevUpdate>,
}

impl Default for ChebyshevRate {
    fn default() -> Self {
        Self {
            tmin: f64::NAN,
            tmax: f64::NAN,
            pmin: f64::NAN,
            pmax: f64::NAN,
            coeffs: DMatrix::from_element(1, 1, f64::NAN),
            units: Units::default(),
            input: ConfigMap::default(),
            link: RateLink::default(),
        }
    }
}

fn check_limits(tmin: f64, tmax: f64, pmin: f64, pmax: f64) -> Result<(), RateError> {
    if !(tmin > 0.0 && tmin < tmax) {
        return Err(RateError::config(format!(
            "Invalid Chebyshev temperature range [{}, {}]",
            tmin, tmax
        )));
    }
    if !(pmin > 0.0 && pmin < pmax) {
        return Err(RateError::config(format!(
            "Invalid Chebyshev pressure range [{}, {}]",
            pmin, pmax
        )));
    }
    Ok(())
}

/// Σ c_i T_i(x) by the three-term recurrence
fn chebyshev_sum<'a>(coeffs: impl Iterator<Item = &'a f64>, x: f64) -> f64 {
    let (mut t_prev, mut t_curr) = (1.0, x);
    let mut sum = 0.0;
    for (i, c) in coeffs.enumerate() {
        let t_i = match i {
            0 => 1.0,
            1 => x,
            _ => {
                let t_next = 2.0 * x * t_curr - t_prev;
                t_prev = t_curr;
                t_curr = t_next;
                t_next
            }
        };
        sum += c * t_i;
    }
    sum
}

impl ChebyshevRate {
    /// Temperatures in K, pressures in Pa; `coeffs` give log10 of k in SI units.
    pub fn new(
        tmin: f64,
        tmax: f64,
        pmin: f64,
        pmax: f64,
        coeffs: DMatrix<f64>,
    ) -> Result<Self, RateError> {
        let mut rate = ChebyshevRate::default();
        rate.set_limits(tmin, tmax, pmin, pmax)?;
        rate.set_coeffs(coeffs)?;
        Ok(rate)
    }
    pub fn from_config(node: &ConfigMap, rate_units: &Units) -> Result<Self, RateError> {
        let mut rate = ChebyshevRate::default();
        rate.set_parameters(node, rate_units)?;
        Ok(rate)
    }

    pub fn temperature_min(&self) -> f64 {
        self.tmin
    }
    pub fn temperature_max(&self) -> f64 {
        self.tmax
    }
    pub fn pressure_min(&self) -> f64 {
        self.pmin
    }
    pub fn pressure_max(&self) -> f64 {
        self.pmax
    }
    pub fn coeffs(&self) -> &DMatrix<f64> {
        &self.coeffs
    }
    pub fn n_temperature(&self) -> usize {
        self.coeffs.nrows()
    }
    pub fn n_pressure(&self) -> usize {
        self.coeffs.ncols()
    }
    pub fn is_configured(&self) -> bool {
        !(self.tmin.is_nan() || self.coeffs[(0, 0)].is_nan())
    }

    pub fn set_coeffs(&mut self, coeffs: DMatrix<f64>) -> Result<(), RateError> {
        if coeffs.is_empty() {
            return Err(RateError::config("Chebyshev coefficient matrix is empty"));
        }
        self.apply(ChebyshevUpdate::Coeffs(coeffs));
        Ok(())
    }
    pub fn set_limits(&mut self, tmin: f64, tmax: f64, pmin: f64, pmax: f64) -> Result<(), RateError> {
        check_limits(tmin, tmax, pmin, pmax)?;
        self.apply(ChebyshevUpdate::Limits {
            tmin,
            tmax,
            pmin,
            pmax,
        });
        Ok(())
    }

    fn apply(&mut self, update: ChebyshevUpdate) {
        self.apply_update(update.clone());
        self.link.propagate(update);
    }

    fn read_coeffs(node: &ConfigMap) -> Result<DMatrix<f64>, RateError> {
        let Value::Array(rows) = node.at("data")? else {
            return Err(RateError::config("Chebyshev 'data' should be a list of lists"));
        };
        let mut values: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Array(items) = row else {
                return Err(RateError::config(format!(
                    "Chebyshev 'data' row should be a list, found '{}'",
                    row
                )));
            };
            let row = items
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        RateError::config(format!("Chebyshev coefficient '{}' is not a number", v))
                    })
                })
                .collect::<Result<Vec<f64>, RateError>>()?;
            values.push(row);
        }
        let n_temperature = values.len();
        let n_pressure = values.first().map_or(0, Vec::len);
        if n_temperature == 0 || n_pressure == 0 {
            return Err(RateError::config("Chebyshev 'data' is empty"));
        }
        if values.iter().any(|row| row.len() != n_pressure) {
            return Err(RateError::config(
                "Chebyshev 'data' rows have inconsistent lengths",
            ));
        }
        Ok(DMatrix::from_fn(n_temperature, n_pressure, |i, j| values[i][j]))
    }
}

impl RateLaw for ChebyshevRate {
    fn kind(&self) -> RateKind {
        RateKind::Chebyshev
    }
    fn set_parameters(&mut self, node: &ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        let (limits, coeffs) = if node.has_key("data") {
            let t_range = node.convert_vector("temperature-range", &Units::temperature(), Some(2))?;
            let p_range = node.convert_vector("pressure-range", &Units::pressure(), Some(2))?;
            check_limits(t_range[0], t_range[1], p_range[0], p_range[1])?;
            let mut coeffs = Self::read_coeffs(node)?;
            coeffs[(0, 0)] += node.units().factor_for(rate_units).log10();
            ([t_range[0], t_range[1], p_range[0], p_range[1]], coeffs)
        } else {
            debug!("no data given, Chebyshev rate left unconfigured");
            ([f64::NAN; 4], DMatrix::from_element(1, 1, f64::NAN))
        };
        self.units = *rate_units;
        self.input = node.clone();
        let [tmin, tmax, pmin, pmax] = limits;
        self.apply(ChebyshevUpdate::Limits {
            tmin,
            tmax,
            pmin,
            pmax,
        });
        self.apply(ChebyshevUpdate::Coeffs(coeffs));
        Ok(())
    }
    fn get_parameters(&self, out: &mut ConfigMap, rate_units: &Units) -> Result<(), RateError> {
        if !self.is_configured() {
            return Ok(());
        }
        let units = out.units().clone();
        let temperature = Units::temperature();
        let pressure = Units::pressure();
        out.insert(
            "temperature-range",
            vec![
                units.from_si(self.tmin, &temperature),
                units.from_si(self.tmax, &temperature),
            ],
        );
        out.insert(
            "pressure-range",
            vec![
                units.from_si(self.pmin, &pressure),
                units.from_si(self.pmax, &pressure),
            ],
        );
        let mut coeffs = self.coeffs.clone();
        coeffs[(0, 0)] -= units.factor_for(rate_units).log10();
        let data: Vec<Value> = coeffs
            .row_iter()
            .map(|row| Value::from(row.iter().copied().collect::<Vec<f64>>()))
            .collect();
        out.insert("data", data);
        Ok(())
    }
    fn validate(&self, _equation: &str) -> Result<(), RateError> {
        Ok(())
    }
    fn eval_at(&self, temperature: f64, pressure: f64) -> f64 {
        self.eval(&ChebyshevData::at(temperature, pressure))
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

impl BatchRate for ChebyshevRate {
    type Data = ChebyshevData;
    type Update = ChebyshevUpdate;
    const KIND: RateKind = RateKind::Chebyshev;

    fn eval(&self, data: &ChebyshevData) -> f64 {
        let (recip_tmin, recip_tmax) = (1.0 / self.tmin, 1.0 / self.tmax);
        let (log10_pmin, log10_pmax) = (self.pmin.log10(), self.pmax.log10());
        let tr = (2.0 * data.recip_t - recip_tmin - recip_tmax) / (recip_tmax - recip_tmin);
        let pr = (2.0 * data.log10_p - log10_pmin - log10_pmax) / (log10_pmax - log10_pmin);
        // T_i(tr) by recurrence over rows, pressure series per row
        let (mut t_prev, mut t_curr) = (1.0, tr);
        let mut log10_k = 0.0;
        for (i, row) in self.coeffs.row_iter().enumerate() {
            let t_i = match i {
                0 => 1.0,
                1 => tr,
                _ => {
                    let t_next = 2.0 * tr * t_curr - t_prev;
                    t_prev = t_curr;
                    t_curr = t_next;
                    t_next
                }
            };
            log10_k += t_i * chebyshev_sum(row.iter(), pr);
        }
        10f64.powf(log10_k)
    }
    fn apply_update(&mut self, update: ChebyshevUpdate) {
        match update {
            ChebyshevUpdate::Coeffs(coeffs) => self.coeffs = coeffs,
            ChebyshevUpdate::Limits {
                tmin,
                tmax,
                pmin,
                pmax,
            } => {
                self.tmin = tmin;
                self.tmax = tmax;
                self.pmin = pmin;
                self.pmax = pmax;
            }
        }
    }
    fn rate_link(&self) -> &RateLink<ChebyshevUpdate> {
        &self.link
    }
    fn rate_link_mut(&mut self) -> &mut RateLink<ChebyshevUpdate> {
        &mut self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::units::ONE_ATM;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn chebyshev_t(n: usize, x: f64) -> f64 {
        (n as f64 * x.acos()).cos()
    }

    #[test]
    fn test_chebyshev_sum() {
        let c = [0.5, -1.5, 2.0, 0.25, 3.0];
        for x in [-0.9, -0.2, 0.0, 0.4, 1.0] {
            let expected: f64 = c.iter().enumerate().map(|(i, ci)| ci * chebyshev_t(i, x)).sum();
            assert_relative_eq!(chebyshev_sum(c.iter(), x), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_eval_against_direct_sum() {
        let coeffs = DMatrix::from_row_slice(
            3,
            4,
            &[
                8.2883, -1.1397, -0.12059, 0.016034, 1.9764, 1.0037, 7.2865e-03, -0.030432,
                0.3177, 0.26889, 0.094806, -7.6385e-03,
            ],
        );
        let rate = ChebyshevRate::new(290.0, 3000.0, 1000.0, 1.0e7, coeffs.clone()).unwrap();
        let (t, p): (f64, f64) = (1000.0, 2.0e5);
        let tr = (2.0 / t - 1.0 / 290.0 - 1.0 / 3000.0) / (1.0 / 3000.0 - 1.0 / 290.0);
        let pr = (2.0 * p.log10() - 3.0 - 7.0) / (7.0 - 3.0);
        let mut log10_k = 0.0;
        for i in 0..3 {
            for j in 0..4 {
                log10_k += coeffs[(i, j)] * chebyshev_t(i, tr) * chebyshev_t(j, pr);
            }
        }
        assert_relative_eq!(rate.eval_at(t, p), 10f64.powf(log10_k), max_relative = 1e-10);
    }

    #[test]
    fn test_unit_offset_of_first_coefficient() {
        let node = ConfigMap::from_value(json!({
            "units": {"length": "cm", "quantity": "mol"},
            "temperature-range": [290.0, 3000.0],
            "pressure-range": ["0.01 atm", "100 atm"],
            "data": [[8.0, 0.5], [1.0, 0.1]]
        }))
        .unwrap();
        let rate = ChebyshevRate::from_config(&node, &Units::rate_constant(2.0)).unwrap();
        assert_relative_eq!(rate.coeffs()[(0, 0)], 5.0, max_relative = 1e-12);
        assert_eq!(rate.coeffs()[(1, 1)], 0.1);
        assert_relative_eq!(rate.pressure_min(), 0.01 * ONE_ATM, max_relative = 1e-12);

        let out = rate.parameters().unwrap();
        let data = out.get("data").unwrap();
        assert_relative_eq!(data[0][0].as_f64().unwrap(), 8.0, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_input() {
        let ragged = ConfigMap::from_value(json!({
            "temperature-range": [290.0, 3000.0],
            "pressure-range": [1000.0, 1.0e7],
            "data": [[8.0, 0.5], [1.0]]
        }))
        .unwrap();
        assert!(ChebyshevRate::from_config(&ragged, &Units::rate_constant(1.0)).is_err());
        let reversed = ConfigMap::from_value(json!({
            "temperature-range": [3000.0, 290.0],
            "pressure-range": [1000.0, 1.0e7],
            "data": [[8.0]]
        }))
        .unwrap();
        assert!(matches!(
            ChebyshevRate::from_config(&reversed, &Units::rate_constant(1.0)),
            Err(RateError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejected_input_leaves_rate_unchanged() {
        let good = ConfigMap::from_value(json!({
            "temperature-range": [290.0, 3000.0],
            "pressure-range": [1000.0, 1.0e7],
            "data": [[8.0, 0.5]]
        }))
        .unwrap();
        let mut rate = ChebyshevRate::from_config(&good, &Units::rate_constant(1.0)).unwrap();
        let k = rate.eval_at(1000.0, 1.0e5);
        let bad = ConfigMap::from_value(json!({
            "temperature-range": [290.0, 3000.0],
            "pressure-range": [1.0e7, 1000.0],
            "data": [[2.0]]
        }))
        .unwrap();
        assert!(rate.set_parameters(&bad, &Units::rate_constant(2.0)).is_err());
        assert_eq!(rate.input(), &good);
        assert_eq!(rate.units(), &Units::rate_constant(1.0));
        assert_eq!(rate.coeffs().ncols(), 2);
        assert_eq!(rate.eval_at(1000.0, 1.0e5), k);
    }

    #[test]
    fn test_unconfigured() {
        let rate = ChebyshevRate::from_config(&ConfigMap::new(), &Units::rate_constant(1.0)).unwrap();
        assert!(!rate.is_configured());
        assert!(rate.eval_at(1000.0, ONE_ATM).is_nan());
        assert!(rate.parameters().unwrap().is_empty());
    }
}

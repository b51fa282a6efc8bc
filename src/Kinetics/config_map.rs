//! Configuration maps and the parameter codec used by rate laws.
//!
//! A [`ConfigMap`] is an ordered JSON object together with the [`UnitSystem`] in
//! which its bare numbers are expressed. The unit system is set by a `units`
//! directive, e.g.
//! ```json
//! {"units": {"length": "cm", "quantity": "mol", "activation-energy": "cal/mol"},
//!  "rate-constant": {"A": 1.2e13, "b": 0.0, "Ea": 4200.0}}
//! ```
//! and is inherited by nested maps. Any quantity may also carry explicit units,
//! either as a string `"1.2e13 cm^3/mol/s"` or as `{"value": 1.2e13, "units": "cm^3/mol/s"}`.
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::{
    UnitDirective, UnitSystem, Units, activation_energy_from_si, activation_energy_to_si,
};
use serde_json::{Map, Value};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    data: Map<String, Value>,
    units: UnitSystem,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }
    /// empty map whose bare numbers are in `units`
    pub fn with_units(units: UnitSystem) -> Self {
        Self {
            data: Map::new(),
            units,
        }
    }
    pub fn from_value(value: Value) -> Result<Self, RateError> {
        Self::from_value_with_units(value, &UnitSystem::default())
    }
    /// takes serde Value and applies its `units` directive (if any) on top of `parent_units`
    pub fn from_value_with_units(value: Value, parent_units: &UnitSystem) -> Result<Self, RateError> {
        let mut data = match value {
            Value::Object(data) => data,
            other => {
                return Err(RateError::config(format!(
                    "Expected a map but found '{}'",
                    other
                )));
            }
        };
        let units = match data.get("units") {
            Some(directive @ Value::Object(_)) => {
                let directive: UnitDirective = serde_json::from_value(directive.clone())
                    .map_err(|e| RateError::config(format!("Invalid units directive: {}", e)))?;
                data.shift_remove("units");
                parent_units.extended(&directive)?
            }
            _ => parent_units.clone(),
        };
        Ok(Self { data, units })
    }
    pub fn from_json_str(document: &str) -> Result<Self, RateError> {
        let value: Value = serde_json::from_str(document)?;
        Self::from_value(value)
    }
    /// JSON object with a leading `units` directive when the unit system is not the default one
    pub fn to_value(&self) -> Result<Value, RateError> {
        let mut out = Map::new();
        if !self.units.is_default() {
            out.insert("units".to_string(), serde_json::to_value(self.units.directive())?);
        }
        for (key, value) in &self.data {
            out.insert(key.clone(), value.clone());
        }
        Ok(Value::Object(out))
    }

    pub fn units(&self) -> &UnitSystem {
        &self.units
    }
    pub fn has_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
    /// value of a key which must exist
    pub fn at(&self, key: &str) -> Result<&Value, RateError> {
        self.data
            .get(key)
            .ok_or_else(|| RateError::config(format!("Key '{}' not found", key)))
    }
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, RateError> {
        match self.data.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(RateError::config(format!(
                "Key '{}' should be a boolean, found '{}'",
                key, other
            ))),
        }
    }
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, RateError> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(RateError::config(format!(
                "Key '{}' should be a string, found '{}'",
                key, other
            ))),
        }
    }
    /// nested map inheriting our unit system
    pub fn get_map(&self, key: &str) -> Result<ConfigMap, RateError> {
        ConfigMap::from_value_with_units(self.at(key)?.clone(), &self.units)
    }
    pub fn get_map_list(&self, key: &str) -> Result<Vec<ConfigMap>, RateError> {
        match self.at(key)? {
            Value::Array(items) => items
                .iter()
                .map(|item| ConfigMap::from_value_with_units(item.clone(), &self.units))
                .collect(),
            other => Err(RateError::config(format!(
                "Key '{}' should be a list of maps, found '{}'",
                key, other
            ))),
        }
    }

    /// quantity under `key` converted to SI; bare numbers are in this map's unit system
    pub fn convert(&self, key: &str, units: &Units) -> Result<f64, RateError> {
        self.convert_value(self.at(key)?, units)
    }
    pub fn convert_value(&self, value: &Value, units: &Units) -> Result<f64, RateError> {
        let (number, explicit) = split_quantity(value)?;
        match explicit {
            None => Ok(self.units.to_si(number, units)),
            Some(u) => {
                let given = Units::parse(&u)?;
                if !units.is_dimensionless() && !given.same_dimensions(units) {
                    return Err(RateError::config(format!(
                        "Units '{}' are incompatible with '{}'",
                        u, units
                    )));
                }
                Ok(number * given.factor())
            }
        }
    }
    /// list of quantities, optionally of a fixed length
    pub fn convert_vector(
        &self,
        key: &str,
        units: &Units,
        expected_len: Option<usize>,
    ) -> Result<Vec<f64>, RateError> {
        let Value::Array(items) = self.at(key)? else {
            return Err(RateError::config(format!("Key '{}' should be a list", key)));
        };
        if let Some(n) = expected_len {
            if items.len() != n {
                return Err(RateError::config(format!(
                    "Key '{}' should have {} entries, found {}",
                    key,
                    n,
                    items.len()
                )));
            }
        }
        items.iter().map(|v| self.convert_value(v, units)).collect()
    }
    /// activation energy under `key` in J/kmol
    pub fn convert_activation_energy(&self, key: &str) -> Result<f64, RateError> {
        self.convert_activation_energy_value(self.at(key)?)
    }
    pub fn convert_activation_energy_value(&self, value: &Value) -> Result<f64, RateError> {
        let (number, explicit) = split_quantity(value)?;
        match explicit {
            None => self.units.activation_energy_to_si(number),
            Some(u) => activation_energy_to_si(number, &Units::parse(&u)?),
        }
    }
}

/// number and optional units string of a quantity
fn split_quantity(value: &Value) -> Result<(f64, Option<String>), RateError> {
    let not_a_quantity = || RateError::config(format!("'{}' is not a numeric quantity", value));
    match value {
        Value::Number(n) => n.as_f64().map(|x| (x, None)).ok_or_else(not_a_quantity),
        Value::String(s) => {
            let s = s.trim();
            let (number, units) = match s.split_once(char::is_whitespace) {
                Some((number, units)) => (number, Some(units.trim().to_string())),
                None => (s, None),
            };
            let number = number.parse::<f64>().map_err(|_| not_a_quantity())?;
            Ok((number, units.filter(|u| !u.is_empty())))
        }
        Value::Object(node) => {
            let number = node
                .get("value")
                .and_then(Value::as_f64)
                .ok_or_else(not_a_quantity)?;
            let units = match node.get("units") {
                None => None,
                Some(Value::String(u)) => Some(u.clone()),
                Some(_) => return Err(not_a_quantity()),
            };
            Ok((number, units))
        }
        _ => Err(not_a_quantity()),
    }
}

/// Kind of unit conversion requested when a scalar is read from a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// `"toSI"`: general physical quantity to SI
    ToSi,
    /// `"actEnergy"`: activation energy to J/kmol
    ActEnergy,
    /// `""`: no conversion
    NoConversion,
}

impl FromStr for ConversionKind {
    type Err = RateError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toSI" => Ok(ConversionKind::ToSi),
            "actEnergy" => Ok(ConversionKind::ActEnergy),
            "" => Ok(ConversionKind::NoConversion),
            other => Err(RateError::config(format!(
                "Unknown conversion type '{}'",
                other
            ))),
        }
    }
}

/// Scalar child `name` of `parent`. The child must exist. Units attached to the value
/// are applied according to `kind`; a value without units is returned as is.
pub fn get_float(parent: &ConfigMap, name: &str, kind: ConversionKind) -> Result<f64, RateError> {
    let (number, explicit) = split_quantity(parent.at(name)?)?;
    match (kind, explicit) {
        (_, None) | (ConversionKind::NoConversion, _) => Ok(number),
        (ConversionKind::ToSi, Some(u)) => Ok(number * Units::parse(&u)?.factor()),
        (ConversionKind::ActEnergy, Some(u)) => activation_energy_to_si(number, &Units::parse(&u)?),
    }
}

/// Scalar child `name` of `parent` expressed in `default_units`, not in SI: a
/// pressure stored as `"101325 Pa"` read with default units `"atm"` gives 1.0.
/// If the stored units are absent or equal to `default_units` the stored number
/// is returned without any arithmetic.
pub fn get_float_default_units(
    parent: &ConfigMap,
    name: &str,
    default_units: &str,
    kind: ConversionKind,
) -> Result<f64, RateError> {
    let (number, explicit) = split_quantity(parent.at(name)?)?;
    let stored = match explicit {
        None => return Ok(number),
        Some(u) if u.trim() == default_units.trim() => return Ok(number),
        Some(u) => u,
    };
    let target = Units::parse(default_units)?;
    match kind {
        ConversionKind::NoConversion => Err(RateError::config(format!(
            "'{}' is given in '{}' but conversion to '{}' was not requested",
            name, stored, default_units
        ))),
        ConversionKind::ToSi => {
            let given = Units::parse(&stored)?;
            if !given.same_dimensions(&target) {
                return Err(RateError::config(format!(
                    "Units '{}' of '{}' are incompatible with '{}'",
                    stored, name, default_units
                )));
            }
            Ok(number * given.factor() / target.factor())
        }
        ConversionKind::ActEnergy => {
            let si = activation_energy_to_si(number, &Units::parse(&stored)?)?;
            activation_energy_from_si(si, &target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::units::{GAS_CONSTANT, ONE_ATM};
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_units_directive_is_inherited() {
        let node = ConfigMap::from_value(json!({
            "units": {"length": "cm", "quantity": "mol"},
            "rate-constant": {"A": 1.0e13, "b": 0.0, "Ea": 0.0}
        }))
        .unwrap();
        assert!(!node.has_key("units"));
        let rc = node.get_map("rate-constant").unwrap();
        assert_eq!(rc.units(), node.units());
        let a = rc.convert("A", &Units::rate_constant(2.0)).unwrap();
        assert_relative_eq!(a, 1.0e10, max_relative = 1e-12);
    }

    #[test]
    fn test_explicit_quantity_forms() {
        let node = ConfigMap::from_value(json!({
            "P1": "1.0 atm",
            "P2": {"value": 2.0, "units": "bar"},
            "P3": 500.0,
            "T": "300 m"
        }))
        .unwrap();
        let p = Units::pressure();
        assert_eq!(node.convert("P1", &p).unwrap(), ONE_ATM);
        assert_eq!(node.convert("P2", &p).unwrap(), 2.0e5);
        assert_eq!(node.convert("P3", &p).unwrap(), 500.0);
        assert!(node.convert("T", &Units::temperature()).is_err());
        assert!(matches!(node.convert("missing", &p), Err(RateError::Configuration(_))));
    }

    #[test]
    fn test_round_trip_through_value_keeps_units() {
        let node = ConfigMap::from_value(json!({
            "units": {"activation-energy": "kcal/mol"},
            "Ea": 10.0
        }))
        .unwrap();
        let again = ConfigMap::from_value(node.to_value().unwrap()).unwrap();
        assert_eq!(again, node);
        assert_relative_eq!(
            again.convert_activation_energy("Ea").unwrap(),
            4.184e7,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_get_bool_and_str() {
        let node = ConfigMap::from_value(json!({"negative-A": true, "type": "Chebyshev", "x": 1})).unwrap();
        assert!(node.get_bool("negative-A", false).unwrap());
        assert!(!node.get_bool("duplicate", false).unwrap());
        assert!(node.get_bool("x", false).is_err());
        assert_eq!(node.get_str("type").unwrap(), Some("Chebyshev"));
        assert!(node.get_str("x").is_err());
        assert!(ConfigMap::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_conversion_kind_tags() {
        assert_eq!("toSI".parse::<ConversionKind>().unwrap(), ConversionKind::ToSi);
        assert_eq!("actEnergy".parse::<ConversionKind>().unwrap(), ConversionKind::ActEnergy);
        assert_eq!("".parse::<ConversionKind>().unwrap(), ConversionKind::NoConversion);
        assert!("toCGS".parse::<ConversionKind>().is_err());
    }

    #[test]
    fn test_get_float() {
        let node = ConfigMap::from_value(json!({
            "pressure": {"value": 1.0, "units": "atm"},
            "Ea": {"value": 1000.0, "units": "K"},
            "plain": 3.5
        }))
        .unwrap();
        assert_eq!(get_float(&node, "pressure", ConversionKind::ToSi).unwrap(), ONE_ATM);
        assert_eq!(get_float(&node, "pressure", ConversionKind::NoConversion).unwrap(), 1.0);
        assert_relative_eq!(
            get_float(&node, "Ea", ConversionKind::ActEnergy).unwrap(),
            1000.0 * GAS_CONSTANT,
            max_relative = 1e-12
        );
        assert_eq!(get_float(&node, "plain", ConversionKind::ToSi).unwrap(), 3.5);
        assert!(matches!(
            get_float(&node, "absent", ConversionKind::ToSi),
            Err(RateError::Configuration(_))
        ));
    }

    #[test]
    fn test_get_float_default_units_short_circuit() {
        let stored: f64 = 0.1 + 0.2;
        let node = ConfigMap::from_value(json!({
            "pressure": {"value": stored, "units": "atm"},
            "Ea": {"value": 1.0, "units": "kcal/mol"},
            "bare": 7.0
        }))
        .unwrap();
        let p = get_float_default_units(&node, "pressure", "atm", ConversionKind::ToSi).unwrap();
        assert_eq!(p.to_bits(), stored.to_bits());
        assert_eq!(
            get_float_default_units(&node, "bare", "Pa", ConversionKind::ToSi).unwrap(),
            7.0
        );
        let pa = get_float_default_units(&node, "pressure", "Pa", ConversionKind::ToSi).unwrap();
        assert_relative_eq!(pa, stored * ONE_ATM, max_relative = 1e-12);
        let ea = get_float_default_units(&node, "Ea", "cal/mol", ConversionKind::ActEnergy).unwrap();
        assert_relative_eq!(ea, 1000.0, max_relative = 1e-12);
        assert!(get_float_default_units(&node, "Ea", "cal/mol", ConversionKind::NoConversion).is_err());
        assert!(get_float_default_units(&node, "absent", "Pa", ConversionKind::ToSi).is_err());
    }

    #[test]
    fn test_get_float_default_units_is_not_si() {
        let node = ConfigMap::from_value(json!({
            "pressure": "101325 Pa",
            "Ea": "1.0 kcal/mol"
        }))
        .unwrap();
        let atm = get_float_default_units(&node, "pressure", "atm", ConversionKind::ToSi).unwrap();
        assert_relative_eq!(atm, 1.0, max_relative = 1e-12);
        let kj = get_float_default_units(&node, "Ea", "kJ/mol", ConversionKind::ActEnergy).unwrap();
        assert_relative_eq!(kj, 4.184, max_relative = 1e-12);
        assert_relative_eq!(
            get_float(&node, "pressure", ConversionKind::ToSi).unwrap(),
            ONE_ATM,
            max_relative = 1e-12
        );
    }
}

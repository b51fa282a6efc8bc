/// Units of measurement: parsing of unit strings, unit systems set by `units` directives,
/// conversion of activation energies. Internally everything is SI with kmol.
pub mod units;
/// Configuration maps (ordered JSON objects with a unit system) and the scalar readers
/// get_float / get_float_default_units
pub mod config_map;
pub mod rate_errors;
/// Per-condition data shared by rate laws of one kind during batch evaluation
pub mod rate_data;
/// The RateLaw interface, the ReactionRate enum over all rate laws and the factory
/// building a rate law from the `type` field of a configuration map
/// # Examples
/// ```
/// use KiTheRates::Kinetics::config_map::ConfigMap;
/// use KiTheRates::Kinetics::rate_api::{RateLaw, create_rate};
/// use KiTheRates::Kinetics::units::Units;
/// let node = ConfigMap::from_json_str(r#"{
///     "units": {"length": "cm", "quantity": "mol", "activation-energy": "cal/mol"},
///     "rate-constant": {"A": 3.87e4, "b": 2.7, "Ea": 6260.0}
/// }"#).unwrap();
/// let rate = create_rate(&node, &Units::rate_constant(2.0)).unwrap();
/// rate.validate("O + H2 <=> H + OH").unwrap();
/// let k = rate.eval_at(1000.0, 101325.0);
/// assert!(k > 0.0);
/// ```
pub mod rate_api;
/// modified Arrhenius rate law
pub mod arrhenius;
/// pressure-dependent Arrhenius (PLOG) rate law
pub mod plog;
/// Chebyshev polynomial fit in temperature and pressure
pub mod chebyshev;
pub mod custom_rate;
/// Evaluator registries: batched evaluation of all rate laws of one kind, linked to
/// their front-end rate laws by update channels
pub mod multi_rate;
#[cfg(test)]
mod rate_tests;

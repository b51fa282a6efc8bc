use crate::Kinetics::arrhenius::{Arrhenius, ArrheniusRate};
use crate::Kinetics::chebyshev::ChebyshevRate;
use crate::Kinetics::config_map::ConfigMap;
use crate::Kinetics::custom_rate::CustomFuncRate;
use crate::Kinetics::multi_rate::{BatchRate, MultiRate, RateEvaluators};
use crate::Kinetics::plog::PlogRate;
use crate::Kinetics::rate_api::{RateKind, RateLaw, ReactionRate, create_rate, create_rate_by_name};
use crate::Kinetics::rate_data::RateData;
use crate::Kinetics::rate_errors::RateError;
use crate::Kinetics::units::{ONE_ATM, Units};
use crate::Utils::logging::init_logger;
use approx::assert_relative_eq;
use nalgebra::DMatrix;
use serde_json::{Value, json};
use simplelog::LevelFilter;
use std::sync::Arc;

const TEMPERATURES: [f64; 3] = [300.0, 1000.0, 3000.0];

fn arrhenius_input() -> Value {
    json!({
        "units": {"length": "cm", "quantity": "mol", "activation-energy": "cal/mol"},
        "rate-constant": {"A": 3.87e4, "b": 2.7, "Ea": 6260.0}
    })
}

fn plog_input() -> Value {
    json!({
        "type": "pressure-dependent-Arrhenius",
        "units": {"length": "cm", "quantity": "mol", "activation-energy": "cal/mol"},
        "rate-constants": [
            {"P": "0.039474 atm", "A": 2.72e9, "b": 1.2, "Ea": 6834.0},
            {"P": "1.0 atm", "A": 1.26e20, "b": -1.83, "Ea": 15003.0},
            {"P": "1.0 atm", "A": 1.23e4, "b": 2.68, "Ea": 6335.0},
            {"P": "10.0 atm", "A": 1.68e16, "b": -0.6, "Ea": 14754.0}
        ]
    })
}

fn chebyshev_input() -> Value {
    json!({
        "type": "Chebyshev",
        "units": {"length": "cm", "quantity": "mol", "activation-energy": "cal/mol"},
        "temperature-range": [290.0, 3000.0],
        "pressure-range": ["0.0098692 atm", "98.692 atm"],
        "data": [
            [8.2883, -1.1397, -0.12059, 0.016034],
            [1.9764, 1.0037, 7.2865e-03, -0.030432],
            [0.3177, 0.26889, 0.094806, -7.6385e-03],
            [-0.031285, -0.039412, 0.044375, 0.014458]
        ]
    })
}

fn build(input: Value) -> ReactionRate {
    let node = ConfigMap::from_value(input).unwrap();
    create_rate(&node, &Units::rate_constant(2.0)).unwrap()
}

fn assert_round_trip(rate: &ReactionRate) {
    let written = rate.to_config(rate.input().units()).unwrap();
    let document = written.to_value().unwrap();
    let again = build(document);
    assert_eq!(again.kind(), rate.kind());
    for t in TEMPERATURES {
        for p in [0.1 * ONE_ATM, ONE_ATM, 5.0 * ONE_ATM] {
            assert_relative_eq!(again.eval_at(t, p), rate.eval_at(t, p), max_relative = 1e-12);
        }
    }
}

#[test]
fn test_round_trip_all_codec_kinds() {
    let _ = init_logger(LevelFilter::Info);
    assert_round_trip(&build(arrhenius_input()));
    assert_round_trip(&build(plog_input()));
    assert_round_trip(&build(chebyshev_input()));
}

#[test]
fn test_round_trip_keeps_input_units() {
    let rate = build(arrhenius_input());
    let out = rate.parameters().unwrap().to_value().unwrap();
    assert_eq!(out["units"]["length"], json!("cm"));
    assert_relative_eq!(out["rate-constant"]["A"].as_f64().unwrap(), 3.87e4, max_relative = 1e-12);
    assert_relative_eq!(out["rate-constant"]["Ea"].as_f64().unwrap(), 6260.0, max_relative = 1e-12);
    assert_eq!(out["rate-constant"]["b"], json!(2.7));
}

#[test]
fn test_plog_knot_matches_arrhenius() {
    let rate = build(plog_input());
    let ReactionRate::Plog(plog) = &rate else {
        panic!("expected a PLOG rate");
    };
    let (p, low) = plog.rates()[0];
    for t in TEMPERATURES {
        assert_eq!(rate.eval_at(t, p), low.eval_t(t));
    }
    // duplicate entries at 1 atm are summed
    let at_one_atm: Vec<Arrhenius> = plog
        .rates()
        .iter()
        .filter(|(p, _)| *p == plog.rates()[1].0)
        .map(|(_, a)| *a)
        .collect();
    assert_eq!(at_one_atm.len(), 2);
    let t = 1000.0;
    assert_relative_eq!(
        rate.eval_at(t, plog.rates()[1].0),
        at_one_atm[0].eval_t(t) + at_one_atm[1].eval_t(t),
        max_relative = 1e-14
    );
}

#[test]
fn test_link_propagates_setters() {
    let mut registry: MultiRate<ArrheniusRate> = MultiRate::new();
    let a0 = 1.0e10;
    let mut rate = ArrheniusRate::new(a0, 0.5, 4.0e7);
    let slot = registry.link(&mut rate);
    assert_eq!(rate.index().unwrap(), slot);
    rate.set_pre_exponential_factor(2.0 * a0);
    let k = registry.evaluate_all(1000.0, ONE_ATM);
    assert_eq!(k[slot], rate.eval_at(1000.0, ONE_ATM));
    assert_eq!(registry.rate(slot).unwrap().pre_exponential_factor(), 2.0 * a0);

    rate.set_temperature_exponent(0.0);
    rate.set_activation_energy(0.0);
    assert_eq!(registry.sync(), 2);
    assert_eq!(registry.evaluate_all(700.0, ONE_ATM)[slot], 2.0 * a0);
}

#[test]
fn test_clone_of_linked_rate_shares_link() {
    let mut registry: MultiRate<ArrheniusRate> = MultiRate::new();
    let mut rate = ArrheniusRate::new(1.0e10, 0.0, 0.0);
    let slot = registry.link(&mut rate);
    let mut twin = rate.clone();
    twin.set_pre_exponential_factor(5.0);
    assert_eq!(registry.evaluate_all(1000.0, ONE_ATM)[slot], 5.0);
}

#[test]
fn test_index_of_unlinked_rate() {
    let rate = build(chebyshev_input());
    assert!(matches!(rate.index(), Err(RateError::Linkage(_))));
    assert!(!rate.is_linked());
}

#[test]
fn test_release_and_relink() {
    let mut registry: MultiRate<ArrheniusRate> = MultiRate::new();
    let mut first = ArrheniusRate::new(1.0e10, 0.0, 0.0);
    let mut second = ArrheniusRate::new(3.0e10, 0.0, 0.0);
    let s1 = registry.link(&mut first);
    let s2 = registry.link(&mut second);

    // update queued before release is dropped with the slot
    first.set_pre_exponential_factor(7.0);
    registry.release(&mut first).unwrap();
    assert!(!first.is_linked());
    assert_eq!(registry.sync(), 0);
    let k = registry.evaluate_all(1000.0, ONE_ATM);
    assert!(k[s1].is_nan());
    assert_eq!(k[s2], 3.0e10);
    registry.release(&mut first).unwrap();

    let s3 = registry.link(&mut second);
    assert_ne!(s3, s2);
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.active_count(), 1);
    assert!(registry.evaluate_all(1000.0, ONE_ATM)[s2].is_nan());

    let mut other: MultiRate<ArrheniusRate> = MultiRate::new();
    assert!(matches!(other.release(&mut second), Err(RateError::Linkage(_))));
    assert!(second.is_linked());
}

#[test]
fn test_relink_into_other_registry_retires_old_slot() {
    let mut first: MultiRate<ArrheniusRate> = MultiRate::new();
    let mut second: MultiRate<ArrheniusRate> = MultiRate::new();
    let mut rate = ArrheniusRate::new(1.0e10, 0.0, 0.0);
    let old_slot = first.link(&mut rate);
    assert_eq!(rate.rate_link().registry(), Some(first.id()));
    let new_slot = second.link(&mut rate);
    assert_eq!(rate.rate_link().registry(), Some(second.id()));
    rate.set_pre_exponential_factor(5.0);

    let k_first = first.evaluate_all(1000.0, ONE_ATM);
    assert!(k_first[old_slot].is_nan());
    assert_eq!(first.active_count(), 0);
    assert!(first.rate(old_slot).is_none());
    assert_eq!(second.evaluate_all(1000.0, ONE_ATM)[new_slot], 5.0);

    // the rate now belongs to the second registry only
    assert!(matches!(first.release(&mut rate), Err(RateError::Linkage(_))));
    second.release(&mut rate).unwrap();
    assert_eq!(second.active_count(), 0);
}

#[test]
fn test_shared_data_follows_last_pass() {
    let mut registry: MultiRate<PlogRate> = MultiRate::new();
    assert!(registry.shared_data().temperature().is_nan());
    let mut rate = PlogRate::new(vec![(ONE_ATM, Arrhenius::new(1.0e10, 0.0, 0.0))]);
    registry.link(&mut rate);
    registry.evaluate_all(1500.0, 2.0 * ONE_ATM);
    assert_eq!(registry.shared_data().temperature(), 1500.0);
    assert_eq!(registry.shared_data().log_p, (2.0 * ONE_ATM).ln());
}

#[test]
fn test_plog_chebyshev_custom_updates_reach_registry() {
    let mut evaluators = RateEvaluators::new();
    let mut plog = PlogRate::new(vec![(ONE_ATM, Arrhenius::new(1.0e10, 0.0, 0.0))]);
    let mut chebyshev =
        ChebyshevRate::new(300.0, 2000.0, 1.0e3, 1.0e7, DMatrix::from_element(1, 1, 2.0)).unwrap();
    let mut custom = CustomFuncRate::with_function(|t| t);
    let p_slot = evaluators.plog.link(&mut plog);
    let c_slot = evaluators.chebyshev.link(&mut chebyshev);
    let f_slot = evaluators.custom.link(&mut custom);

    plog.set_rates(vec![(ONE_ATM, Arrhenius::new(4.0, 0.0, 0.0))]);
    chebyshev.set_coeffs(DMatrix::from_element(1, 1, 3.0)).unwrap();
    custom.set_rate_function(Some(Arc::new(|t: f64| 2.0 * t)));

    let values = evaluators.evaluate_all(500.0, ONE_ATM);
    assert_eq!(values.plog[p_slot], 4.0);
    assert_relative_eq!(values.chebyshev[c_slot], 1000.0, max_relative = 1e-12);
    assert_eq!(values.custom[f_slot], 1000.0);

    custom.set_rate_function(None);
    assert!(evaluators.evaluate_all(500.0, ONE_ATM).custom[f_slot].is_nan());
}

#[test]
fn test_evaluators_dispatch_by_kind() {
    let mut evaluators = RateEvaluators::new();
    let mut rates = vec![
        build(arrhenius_input()),
        build(plog_input()),
        build(chebyshev_input()),
        ReactionRate::from(CustomFuncRate::with_function(|t| t / 1000.0)),
        build(arrhenius_input()),
    ];
    for rate in rates.iter_mut() {
        evaluators.link(rate);
    }
    assert_eq!(rates[4].index().unwrap(), 1);
    assert_eq!(evaluators.arrhenius.len(), 2);

    let (t, p) = (1200.0, 2.0 * ONE_ATM);
    let values = evaluators.evaluate_all(t, p);
    for rate in &rates {
        assert_eq!(values.value_of(rate).unwrap(), rate.eval_at(t, p));
    }
    assert_eq!(values.by_kind(RateKind::CustomFunction), &[1.2]);

    evaluators.release(&mut rates[0]).unwrap();
    let table = evaluators.rate_table(t, p);
    // header plus four active slots
    assert_eq!(table.len(), 5);
    assert!(matches!(
        evaluators.evaluate_all(t, p).value_of(&rates[0]),
        Err(RateError::Linkage(_))
    ));
}

#[test]
fn test_create_rate_factory() {
    let rate_units = Units::rate_constant(1.0);
    let bare = ConfigMap::from_value(json!({"rate-constant": [1.0e5, 0.0, 0.0]})).unwrap();
    assert_eq!(create_rate(&bare, &rate_units).unwrap().kind(), RateKind::Arrhenius);

    let custom = ConfigMap::from_value(json!({"type": "custom-rate-function"})).unwrap();
    assert!(matches!(create_rate(&custom, &rate_units), Err(RateError::Configuration(_))));
    let unknown = ConfigMap::from_value(json!({"type": "falloff"})).unwrap();
    assert!(matches!(create_rate(&unknown, &rate_units), Err(RateError::Configuration(_))));

    for name in ["Arrhenius", "plog", "Chebyshev", "custom-rate-function"] {
        let rate = create_rate_by_name(name).unwrap();
        assert!(rate.eval_at(1000.0, ONE_ATM).is_nan());
        assert_eq!(rate.kind(), name.parse::<RateKind>().unwrap());
    }
    assert_eq!(
        "pressure-dependent-Arrhenius".parse::<RateKind>().unwrap().to_string(),
        "pressure-dependent-Arrhenius"
    );
}

#[test]
fn test_validation_error_names_reaction() {
    let node = ConfigMap::from_value(json!({"rate-constant": {"A": -2.0, "b": 0.0, "Ea": 0.0}})).unwrap();
    let rate = create_rate(&node, &Units::rate_constant(1.0)).unwrap();
    let err = rate.validate("H2 + O <=> H + OH").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid rate in reaction 'H2 + O <=> H + OH': Undeclared negative pre-exponential factor found"
    );
}

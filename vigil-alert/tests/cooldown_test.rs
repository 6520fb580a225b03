//! CooldownGate timing scenarios and thread safety

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vigil_alert::cooldown::{CooldownGate, GateDecision, SuppressReason};
use vigil_alert::AlertError;
use vigil_core::config::CooldownConfig;

fn at(t0: Instant, secs: f64) -> Instant {
    t0 + Duration::from_secs_f64(secs)
}

#[test]
fn test_key_window_boundaries() {
    let t0 = Instant::now();

    let gate = CooldownGate::new(CooldownConfig::default()).unwrap();
    assert!(gate.evaluate("carro cerca", "car", 90.0, t0).is_emit());
    assert!(!gate.evaluate("carro lejos", "car", 90.0, at(t0, 1.9)).is_emit());

    let gate = CooldownGate::new(CooldownConfig::default()).unwrap();
    assert!(gate.evaluate("carro cerca", "car", 90.0, t0).is_emit());
    assert!(gate.evaluate("carro lejos", "car", 90.0, at(t0, 2.1)).is_emit());
}

#[test]
fn test_repeated_message_with_other_key() {
    let t0 = Instant::now();

    let gate = CooldownGate::new(CooldownConfig::default()).unwrap();
    assert!(gate.evaluate("Precaución", "car", 50.0, t0).is_emit());
    match gate.evaluate("Precaución", "bus", 50.0, at(t0, 2.5)) {
        GateDecision::Suppress(SuppressReason::RepeatedMessage { remaining }) => {
            assert!((remaining.as_secs_f64() - 0.5).abs() < 1e-6);
        }
        other => panic!("expected repeated message suppression, got {:?}", other),
    }
    assert!(gate.evaluate("Precaución", "bus", 50.0, at(t0, 3.1)).is_emit());
}

#[test]
fn test_different_keys_and_messages_pass_together() {
    let gate = CooldownGate::new(CooldownConfig::default()).unwrap();
    let now = Instant::now();
    assert!(gate.evaluate("carro", "car", 90.0, now).is_emit());
    assert!(gate.evaluate("persona", "person", 45.0, now).is_emit());
    assert_eq!(gate.snapshot().last_message().map(|(text, _)| text), Some("persona"));
}

#[test]
fn test_custom_window() {
    let config = CooldownConfig {
        window_secs: 0.5,
        min_danger_score: 10.0,
        repeat_factor: 1.0,
    };
    let gate = CooldownGate::new(config).unwrap();
    let t0 = Instant::now();
    assert!(gate.evaluate("a", "dog", 15.0, t0).is_emit());
    assert!(!gate.evaluate("a", "dog", 15.0, at(t0, 0.4)).is_emit());
    assert!(gate.evaluate("a", "dog", 15.0, at(t0, 0.6)).is_emit());
}

#[test]
fn test_unrepresentable_window_rejected_at_construction() {
    let config = CooldownConfig {
        window_secs: 1e20,
        ..CooldownConfig::default()
    };
    assert!(matches!(CooldownGate::new(config), Err(AlertError::Config(_))));
}

#[test]
fn test_concurrent_callers_same_key_single_pass() {
    let gate = Arc::new(CooldownGate::new(CooldownConfig::default()).unwrap());
    let now = Instant::now();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gate = gate.clone();
            thread::spawn(move || gate.evaluate(&format!("mensaje {}", i), "car", 90.0, now).is_emit())
        })
        .collect();

    let emitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|emitted| *emitted)
        .count();
    assert_eq!(emitted, 1);
}

proptest::proptest! {
    #[test]
    fn prop_same_key_emissions_respect_window(gaps in proptest::collection::vec(0u64..3_000, 1..40)) {
        let gate = CooldownGate::new(CooldownConfig::default()).unwrap();
        let t0 = Instant::now();
        let mut now = t0;
        let mut emitted: Vec<Instant> = Vec::new();

        for (i, gap) in gaps.iter().enumerate() {
            now += Duration::from_millis(*gap);
            let message = format!("carro {}", i);
            if gate.evaluate(&message, "car", 90.0, now).is_emit() {
                emitted.push(now);
            }
        }

        for pair in emitted.windows(2) {
            proptest::prop_assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(2));
        }
    }
}

use proptest::prelude::*;
use vigil_core::DangerLevel;

proptest! {
    #[test]
    fn test_level_is_monotone(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(DangerLevel::from_score(low) <= DangerLevel::from_score(high));
    }

    #[test]
    fn test_scored_level_is_never_none(score in 0.0f64..=100.0) {
        prop_assert_ne!(DangerLevel::from_score(score), DangerLevel::None);
    }

    #[test]
    fn test_priority_follows_level(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let la = DangerLevel::from_score(a);
        let lb = DangerLevel::from_score(b);
        if la > lb {
            prop_assert!(la.priority() < lb.priority());
        }
    }
}

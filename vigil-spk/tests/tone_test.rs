//! Property tests for the danger score to tone mapping

use proptest::prelude::*;
use vigil_spk::tone::{ToneMapper, ToneSynthesizer};

proptest! {
    #[test]
    fn test_higher_score_is_more_urgent(a in 20.0f64..=100.0, b in 20.0f64..=100.0) {
        let mapper = ToneMapper::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_params = mapper.map(low).unwrap();
        let high_params = mapper.map(high).unwrap();

        prop_assert!(high_params.frequency_hz >= low_params.frequency_hz);
        prop_assert!(high_params.volume >= low_params.volume);
        prop_assert!(high_params.min_interval_s <= low_params.min_interval_s);
        prop_assert!(high_params.duration_s <= low_params.duration_s);
    }

    #[test]
    fn test_parameters_stay_in_range(score in -1000.0f64..1000.0) {
        if let Some(params) = ToneMapper::default().map(score) {
            prop_assert!((400.0..=1200.0).contains(&params.frequency_hz));
            prop_assert!((0.2..=1.0).contains(&params.volume));
            prop_assert!(params.min_interval_s >= 0.15);
            prop_assert!(params.duration_s == 0.08 || params.duration_s == 0.1);
        } else {
            prop_assert!(score < 20.0);
        }
    }
}

#[test]
fn test_custom_threshold() {
    let mapper = ToneMapper::new(50.0);
    assert!(mapper.map(49.0).is_none());
    assert!(mapper.map(50.0).is_some());
}

#[test]
fn test_rendered_tone_is_wav() {
    let synth = ToneSynthesizer::new(22_050).unwrap();
    let params = ToneMapper::default().map(60.0).unwrap();
    let wav = synth.render(&params).unwrap();
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
}

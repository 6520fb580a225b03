//! Danger score to tone mapping and WAV rendering

use crate::error::SpeechError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Default score below which no tone is produced
pub const DEFAULT_MIN_SCORE: f64 = 20.0;

const BASE_FREQUENCY_HZ: f64 = 400.0;
const FREQUENCY_PER_POINT: f64 = 8.0;
const MIN_VOLUME: f64 = 0.2;
const MIN_INTERVAL_S: f64 = 0.15;
const MAX_INTERVAL_S: f64 = 1.5;
const URGENT_SCORE: f64 = 80.0;
const URGENT_DURATION_S: f64 = 0.08;
const NORMAL_DURATION_S: f64 = 0.1;

/// Peak sample value of a full-volume tone
const MAX_AMPLITUDE: f64 = 32_000.0;

/// Audio parameters for one beep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneParameters {
    pub frequency_hz: f64,
    /// In [0, 1]
    pub volume: f64,
    pub duration_s: f64,
    /// Shortest pause before the next beep
    pub min_interval_s: f64,
}

/// Pure mapping from danger score to tone parameters
#[derive(Debug, Clone, Copy)]
pub struct ToneMapper {
    min_score: f64,
}

impl Default for ToneMapper {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

impl ToneMapper {
    pub fn new(min_score: f64) -> Self {
        Self {
            min_score: min_score.clamp(0.0, 100.0),
        }
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Map a score to tone parameters, `None` below the minimum score.
    ///
    /// Scores are clamped to [0, 100] first (NaN counts as 0). Frequency and
    /// volume grow with the score, the repetition interval shrinks.
    pub fn map(&self, danger_score: f64) -> Option<ToneParameters> {
        let score = if danger_score.is_nan() {
            0.0
        } else {
            danger_score.clamp(0.0, 100.0)
        };

        if score < self.min_score {
            return None;
        }

        let duration_s = if score > URGENT_SCORE {
            URGENT_DURATION_S
        } else {
            NORMAL_DURATION_S
        };

        Some(ToneParameters {
            frequency_hz: BASE_FREQUENCY_HZ + score * FREQUENCY_PER_POINT,
            volume: (score / 100.0).powi(2).max(MIN_VOLUME),
            duration_s,
            min_interval_s: (MAX_INTERVAL_S - score / URGENT_SCORE).max(MIN_INTERVAL_S),
        })
    }
}

/// Renders tone parameters as mono 16-bit PCM WAV
#[derive(Debug, Clone, Copy)]
pub struct ToneSynthesizer {
    sample_rate: u32,
}

impl ToneSynthesizer {
    pub fn new(sample_rate: u32) -> Result<Self, SpeechError> {
        if sample_rate == 0 {
            return Err(SpeechError::Tone("Sample rate must be positive".to_string()));
        }
        Ok(Self { sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn render(&self, params: &ToneParameters) -> Result<Bytes, SpeechError> {
        if !params.frequency_hz.is_finite() || params.frequency_hz <= 0.0 {
            return Err(SpeechError::Tone(format!("Invalid frequency: {}", params.frequency_hz)));
        }
        if !params.duration_s.is_finite() || params.duration_s <= 0.0 || params.duration_s > 10.0 {
            return Err(SpeechError::Tone(format!("Invalid duration: {}", params.duration_s)));
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let amplitude = params.volume.clamp(0.0, 1.0) * MAX_AMPLITUDE;
        let sample_count = (params.duration_s * self.sample_rate as f64).round() as u32;
        let step = 2.0 * std::f64::consts::PI * params.frequency_hz / self.sample_rate as f64;

        let mut cursor = Cursor::new(Vec::with_capacity(44 + sample_count as usize * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for i in 0..sample_count {
                let sample = (amplitude * (step * i as f64).sin()) as i16;
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        Ok(Bytes::from(cursor.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_no_tone() {
        let mapper = ToneMapper::default();
        assert!(mapper.map(19.99).is_none());
        assert!(mapper.map(f64::NAN).is_none());
        assert!(mapper.map(-5.0).is_none());
        assert!(mapper.map(20.0).is_some());
    }

    #[test]
    fn test_mapping_values() {
        let mapper = ToneMapper::default();

        let params = mapper.map(100.0).unwrap();
        assert_eq!(params.frequency_hz, 1200.0);
        assert_eq!(params.volume, 1.0);
        assert_eq!(params.duration_s, 0.08);
        assert_eq!(params.min_interval_s, 0.25);

        let params = mapper.map(40.0).unwrap();
        assert_eq!(params.frequency_hz, 720.0);
        assert_eq!(params.volume, 0.2);
        assert_eq!(params.duration_s, 0.1);
        assert!((params.min_interval_s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_score_is_clamped() {
        let mapper = ToneMapper::default();
        assert_eq!(mapper.map(250.0), mapper.map(100.0));
    }

    #[test]
    fn test_render_wav() {
        let synth = ToneSynthesizer::new(8000).unwrap();
        let params = ToneMapper::default().map(90.0).unwrap();
        let wav = synth.render(&params).unwrap();

        let reader = hound::WavReader::new(Cursor::new(wav.to_vec())).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8000);
        // 0.08 s at 8 kHz
        assert_eq!(reader.len(), 640);
    }

    #[test]
    fn test_render_rejects_bad_parameters() {
        let synth = ToneSynthesizer::new(8000).unwrap();
        let params = ToneParameters {
            frequency_hz: 0.0,
            volume: 0.5,
            duration_s: 0.1,
            min_interval_s: 1.0,
        };
        assert!(matches!(synth.render(&params), Err(SpeechError::Tone(_))));
        assert!(ToneSynthesizer::new(0).is_err());
    }
}

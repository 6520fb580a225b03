//! Self-throttling tone emitter fed once per frame

use crate::engines::AudioFormat;
use crate::error::SpeechError;
use crate::sink::AudioSink;
use crate::tone::{ToneMapper, ToneParameters, ToneSynthesizer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use vigil_core::config::ToneConfig;

/// Beeps at a rate that follows the danger score.
///
/// Not queued: a beep is either played right away or skipped. The first
/// render or playback failure turns the beeper off for good.
pub struct Beeper {
    mapper: ToneMapper,
    synthesizer: ToneSynthesizer,
    sink: Arc<dyn AudioSink>,
    last_beep: Option<Instant>,
    active: bool,
}

impl Beeper {
    pub fn new(config: &ToneConfig, sink: Arc<dyn AudioSink>) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;
        Ok(Self {
            mapper: ToneMapper::new(config.min_score),
            synthesizer: ToneSynthesizer::new(config.sample_rate)?,
            sink,
            last_beep: None,
            active: true,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed the current top score. Returns the parameters of the beep played, if any.
    pub fn update(&mut self, danger_score: f64, now: Instant) -> Option<ToneParameters> {
        if !self.active {
            return None;
        }

        let params = self.mapper.map(danger_score)?;

        if let Some(last) = self.last_beep {
            let interval = Duration::from_secs_f64(params.min_interval_s);
            if now.saturating_duration_since(last) < interval {
                return None;
            }
        }

        if let Err(e) = self.beep(&params) {
            warn!("Beeper disabled after failure: {}", e);
            self.active = false;
            return None;
        }

        debug!(
            "Beep {:.0} Hz vol {:.2} (score {:.1})",
            params.frequency_hz, params.volume, danger_score
        );
        self.last_beep = Some(now);
        Some(params)
    }

    fn beep(&self, params: &ToneParameters) -> Result<(), SpeechError> {
        let audio = self.synthesizer.render(params)?;
        self.sink.play(&audio, AudioFormat::Wav)
    }
}

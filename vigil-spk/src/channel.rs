//! Alert channels: how a dispatched alert becomes sound

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::sink::AudioSink;
use crate::synthesizer::SpeechSynthesizer;
use crate::tone::{ToneMapper, ToneSynthesizer};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_core::config::{ChannelKind, ToneConfig};
use vigil_core::AlertCandidate;

/// Result of rendering one alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Audio was produced and handed to the sink
    Played { bytes: usize },
    /// Nothing to play, with the reason
    Skipped(String),
}

/// A way of rendering alerts, the dispatcher's only view of audio output
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Render and start playing one alert. Returns once playback was initiated.
    async fn render(&self, candidate: &AlertCandidate) -> Result<RenderOutcome, SpeechError>;

    fn name(&self) -> &str;
}

/// Speaks the alert message
pub struct SpeechChannel {
    synthesizer: SpeechSynthesizer,
    sink: Arc<dyn AudioSink>,
}

impl SpeechChannel {
    pub fn new(synthesizer: SpeechSynthesizer, sink: Arc<dyn AudioSink>) -> Self {
        Self { synthesizer, sink }
    }

    pub fn synthesizer(&self) -> &SpeechSynthesizer {
        &self.synthesizer
    }
}

#[async_trait]
impl AlertChannel for SpeechChannel {
    async fn render(&self, candidate: &AlertCandidate) -> Result<RenderOutcome, SpeechError> {
        let audio = self.synthesizer.speak(&candidate.message).await?;
        self.sink.play(&audio, self.synthesizer.format())?;
        Ok(RenderOutcome::Played { bytes: audio.len() })
    }

    fn name(&self) -> &str {
        "speech"
    }
}

/// Beeps with the tone of the alert's danger score
pub struct ToneChannel {
    mapper: ToneMapper,
    synthesizer: ToneSynthesizer,
    sink: Arc<dyn AudioSink>,
}

impl ToneChannel {
    pub fn new(config: &ToneConfig, sink: Arc<dyn AudioSink>) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;
        Ok(Self {
            mapper: ToneMapper::new(config.min_score),
            synthesizer: ToneSynthesizer::new(config.sample_rate)?,
            sink,
        })
    }
}

#[async_trait]
impl AlertChannel for ToneChannel {
    async fn render(&self, candidate: &AlertCandidate) -> Result<RenderOutcome, SpeechError> {
        let Some(params) = self.mapper.map(candidate.danger_score) else {
            return Ok(RenderOutcome::Skipped(format!(
                "score {:.1} below tone threshold",
                candidate.danger_score
            )));
        };

        let audio = self.synthesizer.render(&params)?;
        self.sink.play(&audio, crate::engines::AudioFormat::Wav)?;
        Ok(RenderOutcome::Played { bytes: audio.len() })
    }

    fn name(&self) -> &str {
        "tone"
    }
}

/// Logs alerts without producing audio
#[derive(Debug, Default)]
pub struct SilentChannel;

#[async_trait]
impl AlertChannel for SilentChannel {
    async fn render(&self, candidate: &AlertCandidate) -> Result<RenderOutcome, SpeechError> {
        info!("[{}] {}", candidate.level, candidate.message);
        Ok(RenderOutcome::Skipped("silent channel".to_string()))
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Build the configured channel.
///
/// A channel that fails to initialize falls back to the next quieter one
/// (speech, then tone, then silent). Returns the channel with the kind that
/// was actually selected.
pub fn select_channel(
    kind: ChannelKind,
    speech: &SpeechConfig,
    tone: &ToneConfig,
    sink: Arc<dyn AudioSink>,
) -> (Arc<dyn AlertChannel>, ChannelKind) {
    if kind == ChannelKind::Speech {
        match SpeechSynthesizer::new(speech.clone()) {
            Ok(synthesizer) => {
                return (Arc::new(SpeechChannel::new(synthesizer, sink)), ChannelKind::Speech);
            }
            Err(e) => warn!("Speech channel unavailable ({}), falling back to tone", e),
        }
    }

    if matches!(kind, ChannelKind::Speech | ChannelKind::Tone) {
        match ToneChannel::new(tone, sink) {
            Ok(channel) => return (Arc::new(channel), ChannelKind::Tone),
            Err(e) => warn!("Tone channel unavailable ({}), falling back to silent", e),
        }
    }

    (Arc::new(SilentChannel), ChannelKind::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use crate::TtsEngineKind;
    use std::time::Instant;
    use vigil_core::DangerLevel;

    fn candidate(score: f64) -> AlertCandidate {
        AlertCandidate::new("Atención, persona adelante", "person", DangerLevel::from_score(score), score, Instant::now())
    }

    #[test]
    fn test_speech_failure_falls_back_to_tone() {
        let mut speech = SpeechConfig::default();
        speech.engine = TtsEngineKind::Custom("unregistered".to_string());
        let (channel, kind) = select_channel(ChannelKind::Speech, &speech, &ToneConfig::default(), Arc::new(NullSink));
        assert_eq!(kind, ChannelKind::Tone);
        assert_eq!(channel.name(), "tone");
    }

    #[test]
    fn test_tone_failure_falls_back_to_silent() {
        let mut tone = ToneConfig::default();
        tone.sample_rate = 10;
        let (channel, kind) = select_channel(ChannelKind::Tone, &SpeechConfig::default(), &tone, Arc::new(NullSink));
        assert_eq!(kind, ChannelKind::Silent);
        assert_eq!(channel.name(), "silent");
    }

    #[tokio::test]
    async fn test_tone_channel_skips_quiet_scores() {
        let channel = ToneChannel::new(&ToneConfig::default(), Arc::new(NullSink)).unwrap();
        let outcome = channel.render(&candidate(10.0)).await.unwrap();
        assert!(matches!(outcome, RenderOutcome::Skipped(_)));

        let outcome = channel.render(&candidate(70.0)).await.unwrap();
        assert!(matches!(outcome, RenderOutcome::Played { bytes } if bytes > 44));
    }

    #[tokio::test]
    async fn test_silent_channel_never_plays() {
        let outcome = SilentChannel.render(&candidate(90.0)).await.unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped("silent channel".to_string()));
    }
}

//! Custom TTS engine implementation
//! Allows the embedding application to plug its own synthesis function

use crate::config::VoiceConfig;
use crate::engines::{sanitize_text, AudioFormat, TtsEngine};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

type SynthesizeFn = Arc<dyn Fn(&str, &VoiceConfig) -> Result<Bytes, SpeechError> + Send + Sync>;

/// Custom TTS engine wrapper
pub struct CustomTtsEngine {
    name: String,
    format: AudioFormat,
    synthesize_fn: SynthesizeFn,
    is_available_fn: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl CustomTtsEngine {
    /// Create a new custom TTS engine
    pub fn new<F1, F2>(name: impl Into<String>, format: AudioFormat, synthesize_fn: F1, is_available_fn: F2) -> Self
    where
        F1: Fn(&str, &VoiceConfig) -> Result<Bytes, SpeechError> + Send + Sync + 'static,
        F2: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            format,
            synthesize_fn: Arc::new(synthesize_fn),
            is_available_fn: Arc::new(is_available_fn),
        }
    }
}

#[async_trait]
impl TtsEngine for CustomTtsEngine {
    async fn synthesize(&self, text: &str, config: &VoiceConfig) -> Result<Bytes, SpeechError> {
        let sanitized = sanitize_text(text)?;
        (self.synthesize_fn)(&sanitized, config)
    }

    fn is_available(&self) -> bool {
        (self.is_available_fn)()
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn name(&self) -> &str {
        &self.name
    }
}

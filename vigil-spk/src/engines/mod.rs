//! TTS engine implementations

pub mod api;
pub mod command;
pub mod custom;

use crate::config::VoiceConfig;
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Encoding of rendered audio bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to speech audio
    async fn synthesize(&self, text: &str, config: &VoiceConfig) -> Result<Bytes, SpeechError>;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Encoding of the bytes returned by `synthesize`
    fn format(&self) -> AudioFormat;

    /// Get engine name
    fn name(&self) -> &str;
}

/// Longest text any engine accepts
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Largest audio any engine may return
pub const MAX_AUDIO_SIZE: usize = 10 * 1024 * 1024;

/// Shared input checks, returns the text with control characters removed
pub(crate) fn sanitize_text(text: &str) -> Result<String, SpeechError> {
    if text.trim().is_empty() {
        return Err(SpeechError::Synthesizer("Text cannot be empty".to_string()));
    }

    if text.len() > MAX_TEXT_LENGTH {
        return Err(SpeechError::Synthesizer(format!("Text too long (max {} bytes)", MAX_TEXT_LENGTH)));
    }

    Ok(text.chars().filter(|c| !c.is_control()).collect())
}

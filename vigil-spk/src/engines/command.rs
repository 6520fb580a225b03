//! Local command line TTS engine (espeak-ng compatible)

use crate::config::{CommandTtsConfig, VoiceConfig};
use crate::engines::{sanitize_text, AudioFormat, TtsEngine, MAX_AUDIO_SIZE};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs a local synthesizer that writes a WAV stream to stdout
pub struct CommandTtsEngine {
    program: String,
    extra_args: Vec<String>,
    available: bool,
    rate: u32,
    volume: f32,
}

impl CommandTtsEngine {
    pub fn new(config: &CommandTtsConfig, rate: u32, volume: f32) -> Self {
        let available = std::process::Command::new(&config.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);

        if available {
            info!("Command TTS engine '{}' initialized", config.program);
        } else {
            warn!("Command TTS engine '{}' not found", config.program);
        }

        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
            available,
            rate,
            volume,
        }
    }

    /// Arguments for one synthesis call, text last
    fn build_args(&self, text: &str, voice: &VoiceConfig) -> Vec<String> {
        let mut args = self.extra_args.clone();

        // espeak-ng picks the voice by name or by language code
        let voice_name = voice
            .name
            .as_deref()
            .map(|name| {
                name.chars()
                    .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '+' || *c == '_')
                    .take(256)
                    .collect::<String>()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| voice.language.clone());
        args.push("-v".to_string());
        args.push(voice_name);

        args.push("-s".to_string());
        args.push(self.rate.to_string());

        // espeak-ng amplitude runs 0-200, 100 is normal
        let amplitude = (self.volume.clamp(0.0, 1.0) * 100.0).round() as u32;
        args.push("-a".to_string());
        args.push(amplitude.to_string());

        args.push("--stdout".to_string());
        // A leading dash would be read as an option
        args.push(text.trim_start_matches('-').to_string());
        args
    }
}

#[async_trait]
impl TtsEngine for CommandTtsEngine {
    async fn synthesize(&self, text: &str, config: &VoiceConfig) -> Result<Bytes, SpeechError> {
        if !self.available {
            return Err(SpeechError::Engine(format!("{} not available", self.program)));
        }

        let sanitized = sanitize_text(text)?;
        let args = self.build_args(&sanitized, config);
        debug!("Running {} with {} args", self.program, args.len());

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to execute {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Engine(format!("{} failed: {}", self.program, stderr.trim())));
        }

        if output.stdout.is_empty() {
            return Err(SpeechError::Engine(format!("{} produced no audio", self.program)));
        }

        if output.stdout.len() > MAX_AUDIO_SIZE {
            return Err(SpeechError::Engine(format!(
                "Generated audio too large ({} bytes, max {} bytes)",
                output.stdout.len(),
                MAX_AUDIO_SIZE
            )));
        }

        Ok(Bytes::from(output.stdout))
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> CommandTtsEngine {
        CommandTtsEngine {
            program: "espeak-ng".to_string(),
            extra_args: vec!["-q".to_string()],
            available: true,
            rate: 180,
            volume: 0.5,
        }
    }

    #[test]
    fn test_build_args_uses_language_by_default() {
        let args = engine().build_args("Hola", &VoiceConfig::default());
        assert_eq!(args, vec!["-q", "-v", "es", "-s", "180", "-a", "50", "--stdout", "Hola"]);
    }

    #[test]
    fn test_build_args_sanitizes_voice_name() {
        let voice = VoiceConfig {
            name: Some("es+f3; rm -rf".to_string()),
            language: "es".to_string(),
        };
        let args = engine().build_args("--help", &voice);
        assert_eq!(args[2], "es+f3rm-rf");
        assert_eq!(args.last().map(String::as_str), Some("help"));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let config = CommandTtsConfig {
            program: "definitely-not-a-tts-program".to_string(),
            extra_args: Vec::new(),
        };
        let engine = CommandTtsEngine::new(&config, 180, 1.0);
        assert!(!engine.is_available());
        let result = engine.synthesize("Hola", &VoiceConfig::default()).await;
        assert!(matches!(result, Err(SpeechError::Engine(_))));
    }
}

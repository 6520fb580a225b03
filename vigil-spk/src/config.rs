//! Configuration for speech synthesis

use serde::{Deserialize, Serialize};

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Enable speech synthesis
    pub enabled: bool,

    /// Preferred TTS engine
    pub engine: TtsEngineKind,

    /// Voice settings
    pub voice: VoiceConfig,

    /// Speech rate (words per minute, 80-500, default 180)
    pub rate: u32,

    /// Volume (0.0-1.0, default 1.0)
    pub volume: f32,

    /// Command line engine settings
    pub command: CommandTtsConfig,

    /// API configuration (if using API-based TTS)
    pub api_config: Option<ApiTtsConfig>,

    /// Cache synthesized phrases in memory
    pub enable_cache: bool,

    /// Maximum number of cached phrases
    pub max_cache_entries: usize,
}

/// TTS engine type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngineKind {
    /// Local program writing WAV to stdout (espeak-ng by default)
    Command,
    /// HTTP speech API
    Api,
    /// Engine supplied by the embedding application
    Custom(String),
}

/// Voice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Voice name/identifier
    pub name: Option<String>,

    /// Language code (e.g., "es", "en-US")
    pub language: String,
}

/// Command line TTS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTtsConfig {
    /// Program to run
    pub program: String,

    /// Extra arguments placed before the generated ones
    pub extra_args: Vec<String>,
}

/// API TTS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTtsConfig {
    /// API endpoint URL
    pub endpoint: String,

    /// API key (optional, falls back to OPENAI_API_KEY)
    pub api_key: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry_config: RetryConfig,
}

/// Retry configuration for API calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retry attempts
    pub max_retries: u32,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: u64,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: TtsEngineKind::Command,
            voice: VoiceConfig::default(),
            rate: 180,
            volume: 1.0,
            command: CommandTtsConfig::default(),
            api_config: None,
            enable_cache: true,
            max_cache_entries: 256,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: None,
            language: "es".to_string(),
        }
    }
}

impl Default for CommandTtsConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl VoiceConfig {
    /// Validate voice configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.language.is_empty() {
            return Err("Language code cannot be empty".to_string());
        }

        if self.language.len() > 32 {
            return Err("Language code too long (max 32 chars)".to_string());
        }

        if !self.language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("Language code contains invalid characters (only alphanumeric and '-' allowed)".to_string());
        }

        if let Some(ref name) = self.name {
            if name.is_empty() {
                return Err("Voice name cannot be empty if provided".to_string());
            }

            if name.len() > 256 {
                return Err("Voice name too long (max 256 chars)".to_string());
            }

            if name.chars().any(|c| c.is_control()) {
                return Err("Voice name contains invalid characters".to_string());
            }
        }

        Ok(())
    }
}

impl RetryConfig {
    /// Validate retry configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err("Max retries too large (max 10)".to_string());
        }

        if self.initial_delay_ms > self.max_delay_ms {
            return Err("Initial delay cannot be greater than max delay".to_string());
        }

        if self.max_delay_ms > 60_000 {
            return Err("Max delay too large (max 60000 ms)".to_string());
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(80..=500).contains(&self.rate) {
            return Err("Speech rate must be between 80 and 500 WPM".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("Volume must be between 0.0 and 1.0".to_string());
        }

        if self.enable_cache && self.max_cache_entries == 0 {
            return Err("Cache size must be greater than 0 when caching is enabled".to_string());
        }

        if self.max_cache_entries > 10_000 {
            return Err("Cache size too large (max 10000 entries)".to_string());
        }

        self.voice.validate()?;

        if self.engine == TtsEngineKind::Command && self.command.program.trim().is_empty() {
            return Err("TTS program cannot be empty".to_string());
        }

        if self.engine == TtsEngineKind::Api && self.api_config.is_none() {
            return Err("API engine requires api_config".to_string());
        }

        if let Some(api_config) = &self.api_config {
            if !api_config.endpoint.starts_with("https://") {
                return Err("API endpoint must use HTTPS".to_string());
            }

            if api_config.endpoint.len() > 2048 {
                return Err("API endpoint URL too long (max 2048 chars)".to_string());
            }

            if api_config.timeout_secs == 0 {
                return Err("API timeout must be greater than 0".to_string());
            }

            if api_config.timeout_secs > 120 {
                return Err("API timeout too large (max 120 seconds)".to_string());
            }

            api_config.retry_config.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_config_default() {
        let config = SpeechConfig::default();
        assert!(config.enabled);
        assert_eq!(config.engine, TtsEngineKind::Command);
        assert_eq!(config.rate, 180);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.voice.language, "es");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_bounds() {
        let mut config = SpeechConfig::default();
        config.rate = 600;
        assert!(config.validate().is_err());
        config.rate = 80;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_engine_requires_https() {
        let mut config = SpeechConfig::default();
        config.engine = TtsEngineKind::Api;
        assert!(config.validate().is_err());

        config.api_config = Some(ApiTtsConfig {
            endpoint: "http://example.com".to_string(),
            api_key: None,
            model: None,
            timeout_secs: 10,
            retry_config: RetryConfig::default(),
        });
        assert!(config.validate().is_err());

        if let Some(api) = config.api_config.as_mut() {
            api.endpoint = "https://example.com/v1".to_string();
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_voice_language_characters() {
        let mut voice = VoiceConfig::default();
        voice.language = "es; rm".to_string();
        assert!(voice.validate().is_err());
    }
}

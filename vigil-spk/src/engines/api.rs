//! HTTP speech API engine (OpenAI-compatible `/audio/speech`)

use crate::config::{ApiTtsConfig, RetryConfig, VoiceConfig};
use crate::engines::{sanitize_text, AudioFormat, TtsEngine, MAX_AUDIO_SIZE};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_MODEL: &str = "tts-1";
const DEFAULT_VOICE: &str = "alloy";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// API TTS engine
pub struct ApiTtsEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    retry_config: RetryConfig,
    rate: u32,
}

impl ApiTtsEngine {
    pub fn new(config: &ApiTtsConfig, rate: u32) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Engine(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty());

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry_config: config.retry_config.clone(),
            rate,
        })
    }

    /// Speed factor relative to 150 WPM, within the API's 0.25-4.0 range
    fn speed(&self) -> f32 {
        (self.rate as f32 / 150.0).clamp(0.25, 4.0)
    }

    async fn request_once(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, RequestFailure> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| RequestFailure::Fatal(SpeechError::Api("API key missing".to_string())))?;

        let body = json!({
            "model": self.model,
            "input": text,
            "voice": voice.name.as_deref().unwrap_or(DEFAULT_VOICE),
            "speed": self.speed(),
            "response_format": "mp3",
        });

        let response = self
            .client
            .post(format!("{}/audio/speech", self.endpoint))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RequestFailure::Retryable(SpeechError::Api(format!("Request failed: {}", e))))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = SpeechError::Api(format!("HTTP {}: {}", status, text.chars().take(200).collect::<String>()));
            return Err(if is_retryable(status) {
                RequestFailure::Retryable(err)
            } else {
                RequestFailure::Fatal(err)
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| RequestFailure::Retryable(SpeechError::Api(format!("Failed to read body: {}", e))))?;

        if audio.len() > MAX_AUDIO_SIZE {
            return Err(RequestFailure::Fatal(SpeechError::Api(format!(
                "Audio too large ({} bytes, max {} bytes)",
                audio.len(),
                MAX_AUDIO_SIZE
            ))));
        }

        Ok(audio)
    }
}

enum RequestFailure {
    Retryable(SpeechError),
    Fatal(SpeechError),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Exponential backoff delay for the given retry attempt (0-based)
pub(crate) fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.min(16)).unwrap_or(u64::MAX);
    let delay = retry.initial_delay_ms.saturating_mul(factor).min(retry.max_delay_ms);
    Duration::from_millis(delay)
}

#[async_trait]
impl TtsEngine for ApiTtsEngine {
    async fn synthesize(&self, text: &str, config: &VoiceConfig) -> Result<Bytes, SpeechError> {
        let sanitized = sanitize_text(text)?;

        let mut attempt = 0;
        loop {
            match self.request_once(&sanitized, config).await {
                Ok(audio) => return Ok(audio),
                Err(RequestFailure::Fatal(e)) => return Err(e),
                Err(RequestFailure::Retryable(e)) => {
                    if attempt >= self.retry_config.max_retries {
                        return Err(e);
                    }
                    let delay = backoff_delay(&self.retry_config, attempt);
                    warn!("Speech API attempt {} failed: {}, retrying in {:?}", attempt + 1, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn is_available(&self) -> bool {
        let available = self.api_key.is_some();
        if !available {
            debug!("Speech API key not configured");
        }
        available
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
        };
        assert_eq!(backoff_delay(&retry, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(&retry, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(&retry, 3), Duration::from_millis(800));
        assert_eq!(backoff_delay(&retry, 4), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&retry, 40), Duration::from_millis(1000));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_explicit_key_makes_engine_available() {
        let config = ApiTtsConfig {
            endpoint: "https://api.example.com/v1/".to_string(),
            api_key: Some("test-key".to_string()),
            model: None,
            timeout_secs: 5,
            retry_config: RetryConfig::default(),
        };
        let engine = ApiTtsEngine::new(&config, 300).unwrap();
        assert!(engine.is_available());
        assert_eq!(engine.endpoint, "https://api.example.com/v1");
        assert_eq!(engine.model, DEFAULT_MODEL);
        assert_eq!(engine.speed(), 2.0);
    }
}

use async_trait::async_trait;
use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::providers::SceneProvider;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub struct GoogleProvider {
    api_key: Option<String>,
    client: Client,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

impl GoogleProvider {
    pub fn new(config: &SceneConfig) -> Result<Self> {
        config.validate().map_err(SceneError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: config.resolved_api_key(),
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn get_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SceneError::MissingApiKey("Google".to_string()))
    }
}

/// First candidate's text from a generateContent response
pub(crate) fn extract_text(json: &serde_json::Value) -> Result<String> {
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| SceneError::InvalidResponse("No candidates in response".to_string()))?;

    let text: String = parts.iter().filter_map(|part| part["text"].as_str()).collect();
    if text.trim().is_empty() {
        let reason = json["candidates"][0]["finishReason"].as_str().unwrap_or("unknown");
        return Err(SceneError::InvalidResponse(format!("Empty response (finish reason: {})", reason)));
    }
    Ok(text)
}

#[async_trait]
impl SceneProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.get_api_key()?;

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "maxOutputTokens": self.max_output_tokens,
                "temperature": 0.4
            }
        });

        // URL encode model name to prevent injection
        let model_encoded = urlencoding::encode(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model_encoded);

        debug!("Requesting scene text from {}", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SceneError::InvalidResponse(format!(
                "HTTP {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let json: serde_json::Value = response.json().await?;
        extract_text(&json)
    }
}

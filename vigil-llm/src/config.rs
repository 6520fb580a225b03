use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Scene description service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    /// Falls back to the GOOGLE_API_KEY environment variable
    pub api_key: Option<String>,
    /// Repeated analyses within this many seconds reuse the last result
    pub cooldown_secs: f64,
    /// Object names included in the prompt
    pub max_summary_objects: usize,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-flash-latest".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            cooldown_secs: 5.0,
            max_summary_objects: 8,
            max_output_tokens: 256,
            timeout_secs: 30,
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if !self.base_url.starts_with("https://") {
            return Err("Base URL must use HTTPS".to_string());
        }

        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err("Cooldown must be a non-negative number of seconds".to_string());
        }

        if self.cooldown_secs > 86_400.0 {
            return Err("Cooldown too large (max 86400 seconds)".to_string());
        }

        if self.max_summary_objects == 0 || self.max_summary_objects > 64 {
            return Err("Summary objects must be between 1 and 64".to_string());
        }

        if self.max_output_tokens == 0 || self.max_output_tokens > 8192 {
            return Err("Max output tokens must be between 1 and 8192".to_string());
        }

        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err("Timeout must be between 1 and 120 seconds".to_string());
        }

        Ok(())
    }

    /// Configured key, else the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

//! Application configuration file

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vigil_core::VigilConfig;
use vigil_llm::SceneConfig;
use vigil_spk::SpeechConfig;

/// Everything the binary reads from its TOML file. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: VigilConfig,
    pub speech: SpeechConfig,
    pub scene: SceneConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.core.validate().map_err(|e| format!("[core] {}", e))?;
        self.speech.validate().map_err(|e| format!("[speech] {}", e))?;
        self.scene.validate().map_err(|e| format!("[scene] {}", e))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Invalid configuration file")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Defaults when no file is given
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

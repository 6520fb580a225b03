//! Configuration for scoring, cooldown and dispatch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub scoring: ScoringConfig,
    pub cooldown: CooldownConfig,
    pub dispatcher: DispatcherConfig,
    pub tone: ToneConfig,
    /// Channel the dispatcher renders alerts through
    pub channel: ChannelKind,
}

/// Danger scoring knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base threat weight per detector class (1-10)
    pub danger_weights: BTreeMap<String, u32>,

    /// Weight for classes missing from the table
    pub default_weight: u32,

    pub proximity: ProximityThresholds,

    /// Detections below this confidence are not assessed
    pub min_confidence: f32,

    /// Spoken names per detector class
    pub translations: BTreeMap<String, String>,

    pub templates: MessageTemplates,
}

/// Relative-area thresholds for the proximity tiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityThresholds {
    pub very_close: f32,
    pub close: f32,
    pub medium: f32,
}

/// Per-level phrase templates, `{object}` is replaced by the spoken name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub high: String,
    pub medium: String,
    pub low: String,
}

/// Alert rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Minimum seconds between two alerts with the same source key
    pub window_secs: f64,

    /// Scores below this never pass
    pub min_danger_score: f64,

    /// An identical message is held back for `window_secs * repeat_factor`
    pub repeat_factor: f64,
}

/// Alert queue and worker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,

    /// Upper bound on one idle wait of the worker
    pub idle_timeout_ms: u64,

    /// How long shutdown waits for the in-flight render
    pub shutdown_grace_ms: u64,
}

/// Non-speech tone channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Run the per-frame beeper alongside the dispatcher
    pub enabled: bool,

    /// Scores below this produce no tone
    pub min_score: f64,

    pub sample_rate: u32,
}

/// Rendering channel used by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Speech,
    Tone,
    Silent,
}

impl Default for ChannelKind {
    fn default() -> Self {
        ChannelKind::Speech
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let danger_weights = [
            // Vehicles
            ("car", 10),
            ("truck", 10),
            ("bus", 10),
            ("motorcycle", 9),
            ("bicycle", 7),
            // People and animals
            ("person", 5),
            ("dog", 6),
            ("cat", 4),
            ("horse", 7),
            // Static obstacles
            ("chair", 3),
            ("bench", 3),
            ("fire hydrant", 4),
            ("stop sign", 2),
            ("parking meter", 3),
            ("suitcase", 3),
            ("backpack", 2),
        ]
        .into_iter()
        .map(|(class, weight)| (class.to_string(), weight))
        .collect();

        let translations = [
            ("person", "persona"),
            ("car", "carro"),
            ("truck", "camión"),
            ("bus", "autobús"),
            ("motorcycle", "moto"),
            ("bicycle", "bicicleta"),
            ("dog", "perro"),
            ("cat", "gato"),
            ("horse", "caballo"),
            ("chair", "silla"),
            ("bench", "banco"),
            ("fire hydrant", "hidrante"),
            ("stop sign", "señal de alto"),
            ("parking meter", "parquímetro"),
            ("suitcase", "maleta"),
            ("backpack", "mochila"),
            ("bottle", "botella"),
            ("cup", "taza"),
            ("laptop", "laptop"),
            ("cell phone", "teléfono"),
            ("book", "libro"),
            ("clock", "reloj"),
            ("scissors", "tijeras"),
            ("teddy bear", "oso de peluche"),
            ("potted plant", "planta"),
            ("bed", "cama"),
            ("dining table", "mesa"),
            ("toilet", "inodoro"),
            ("tv", "televisor"),
            ("couch", "sofá"),
            ("umbrella", "paraguas"),
        ]
        .into_iter()
        .map(|(class, name)| (class.to_string(), name.to_string()))
        .collect();

        Self {
            danger_weights,
            default_weight: 1,
            proximity: ProximityThresholds::default(),
            min_confidence: 0.5,
            translations,
            templates: MessageTemplates::default(),
        }
    }
}

impl Default for ProximityThresholds {
    fn default() -> Self {
        Self {
            very_close: 0.15,
            close: 0.08,
            medium: 0.03,
        }
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            high: "¡Cuidado! {object} muy cerca, peligro alto".to_string(),
            medium: "Atención, {object} adelante".to_string(),
            low: "{object} detectado a distancia".to_string(),
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            window_secs: 2.0,
            min_danger_score: 20.0,
            repeat_factor: 1.5,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            idle_timeout_ms: 500,
            shutdown_grace_ms: 1000,
        }
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_score: 20.0,
            sample_rate: 22050,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some((class, weight)) = self.danger_weights.iter().find(|(_, w)| !(1..=10).contains(*w)) {
            return Err(format!("Danger weight for '{}' must be between 1 and 10, got {}", class, weight));
        }

        if !(1..=10).contains(&self.default_weight) {
            return Err("Default danger weight must be between 1 and 10".to_string());
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("Minimum confidence must be between 0.0 and 1.0".to_string());
        }

        self.proximity.validate()?;
        self.templates.validate()
    }
}

impl ProximityThresholds {
    pub fn validate(&self) -> std::result::Result<(), String> {
        for value in [self.very_close, self.close, self.medium] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(format!("Proximity threshold must be in (0, 1], got {}", value));
            }
        }

        if !(self.very_close > self.close && self.close > self.medium) {
            return Err("Proximity thresholds must be strictly decreasing (very_close > close > medium)".to_string());
        }

        Ok(())
    }
}

impl MessageTemplates {
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, template) in [("high", &self.high), ("medium", &self.medium), ("low", &self.low)] {
            if template.trim().is_empty() {
                return Err(format!("Message template '{}' cannot be empty", name));
            }
        }
        Ok(())
    }
}

/// Longest cooldown, repeat window included, that validation accepts
pub const MAX_COOLDOWN_SECS: f64 = 86_400.0;

impl CooldownConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.window_secs.is_finite() || self.window_secs < 0.0 {
            return Err("Cooldown window must be a non-negative number of seconds".to_string());
        }

        if !(0.0..=100.0).contains(&self.min_danger_score) {
            return Err("Minimum danger score must be between 0 and 100".to_string());
        }

        if !self.repeat_factor.is_finite() || self.repeat_factor < 1.0 {
            return Err("Repeat factor must be at least 1.0".to_string());
        }

        if self.window_secs * self.repeat_factor > MAX_COOLDOWN_SECS {
            return Err(format!(
                "Cooldown window times repeat factor too large (max {} seconds)",
                MAX_COOLDOWN_SECS
            ));
        }

        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_secs)
    }

    pub fn repeat_window(&self) -> Duration {
        Duration::from_secs_f64(self.window_secs * self.repeat_factor)
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be greater than 0".to_string());
        }

        if self.queue_capacity > 10_000 {
            return Err("Queue capacity too large (max 10000)".to_string());
        }

        if self.idle_timeout_ms == 0 {
            return Err("Idle timeout must be greater than 0".to_string());
        }

        if self.shutdown_grace_ms > 60_000 {
            return Err("Shutdown grace period too large (max 60000 ms)".to_string());
        }

        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl ToneConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=100.0).contains(&self.min_score) {
            return Err("Tone minimum score must be between 0 and 100".to_string());
        }

        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err("Tone sample rate must be between 8000 and 192000 Hz".to_string());
        }

        Ok(())
    }
}

impl VigilConfig {
    /// Validate every section
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.scoring.validate()?;
        self.cooldown.validate()?;
        self.dispatcher.validate()?;
        self.tone.validate()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: VigilConfig = toml::from_str(content)?;
        config.validate().map_err(Error::Configuration)?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

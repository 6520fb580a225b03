//! Speech synthesizer with phrase caching

use crate::config::{SpeechConfig, TtsEngineKind, VoiceConfig};
use crate::engines::api::ApiTtsEngine;
use crate::engines::command::CommandTtsEngine;
use crate::engines::{AudioFormat, TtsEngine, MAX_AUDIO_SIZE};
use crate::error::SpeechError;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// Speech synthesizer with an in-memory phrase cache.
///
/// Alert phrases repeat constantly ("Atención, persona adelante"), so every
/// rendered phrase is kept until the cache is full, oldest evicted first.
pub struct SpeechSynthesizer {
    config: Arc<SpeechConfig>,
    engine: Arc<dyn TtsEngine>,
    cache: Mutex<PhraseCache>,
}

#[derive(Default)]
struct PhraseCache {
    entries: HashMap<String, Bytes>,
    order: VecDeque<String>,
}

impl SpeechSynthesizer {
    /// Create a synthesizer with the engine named in the config
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        if !config.enabled {
            return Err(SpeechError::Config("Speech synthesis is disabled".to_string()));
        }

        let engine: Arc<dyn TtsEngine> = match &config.engine {
            TtsEngineKind::Command => Arc::new(CommandTtsEngine::new(&config.command, config.rate, config.volume)),
            TtsEngineKind::Api => {
                let api_config = config
                    .api_config
                    .as_ref()
                    .ok_or_else(|| SpeechError::Config("API config required for API TTS".to_string()))?;
                Arc::new(ApiTtsEngine::new(api_config, config.rate)?)
            }
            TtsEngineKind::Custom(name) => {
                return Err(SpeechError::Engine(format!(
                    "Custom TTS engine '{}' must be supplied through SpeechSynthesizer::with_engine",
                    name
                )));
            }
        };

        Self::with_engine(config, engine)
    }

    /// Create a synthesizer around an already built engine
    pub fn with_engine(config: SpeechConfig, engine: Arc<dyn TtsEngine>) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        if !engine.is_available() {
            return Err(SpeechError::Engine(format!("TTS engine '{}' not available", engine.name())));
        }

        info!("Speech synthesizer ready (engine: {})", engine.name());
        Ok(Self {
            config: Arc::new(config),
            engine,
            cache: Mutex::new(PhraseCache::default()),
        })
    }

    /// Synthesize text with the configured voice
    pub async fn speak(&self, text: &str) -> Result<Bytes, SpeechError> {
        self.speak_with_voice(text, &self.config.voice).await
    }

    pub async fn speak_with_voice(&self, text: &str, voice: &VoiceConfig) -> Result<Bytes, SpeechError> {
        let cache_key = self.config.enable_cache.then(|| cache_key(text, voice));

        if let Some(key) = &cache_key {
            if let Some(audio) = self.cache.lock().entries.get(key).cloned() {
                debug!("Cache hit for phrase: {}", preview(text));
                return Ok(audio);
            }
        }

        let audio = self.engine.synthesize(text, voice).await?;

        if audio.is_empty() {
            return Err(SpeechError::Synthesizer("Engine returned no audio".to_string()));
        }

        if audio.len() > MAX_AUDIO_SIZE {
            return Err(SpeechError::Synthesizer(format!(
                "Generated audio too large ({} bytes, max {} bytes)",
                audio.len(),
                MAX_AUDIO_SIZE
            )));
        }

        if let Some(key) = cache_key {
            self.insert_cached(key, audio.clone());
        }

        Ok(audio)
    }

    fn insert_cached(&self, key: String, audio: Bytes) {
        let mut cache = self.cache.lock();
        if cache.entries.insert(key.clone(), audio).is_none() {
            cache.order.push_back(key);
        }
        while cache.order.len() > self.config.max_cache_entries {
            if let Some(oldest) = cache.order.pop_front() {
                cache.entries.remove(&oldest);
            }
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.engine.format()
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Number of cached phrases
    pub fn cached_phrases(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        cache.entries.clear();
        cache.order.clear();
    }
}

fn cache_key(text: &str, voice: &VoiceConfig) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    hasher.update(voice.language.as_bytes());
    if let Some(ref name) = voice.name {
        hasher.update([0u8]);
        hasher.update(name.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn preview(text: &str) -> String {
    if text.chars().count() > 50 {
        format!("{}...", text.chars().take(50).collect::<String>())
    } else {
        text.to_string()
    }
}

//! Tests for SpeechSynthesizer caching and engine handling

use async_trait::async_trait;
use bytes::Bytes;
use mockall::mock;
use std::sync::Arc;
use vigil_spk::config::{SpeechConfig, VoiceConfig};
use vigil_spk::engines::{AudioFormat, TtsEngine};
use vigil_spk::error::SpeechError;
use vigil_spk::synthesizer::SpeechSynthesizer;

mock! {
    pub Engine {}

    #[async_trait]
    impl TtsEngine for Engine {
        async fn synthesize(&self, text: &str, config: &VoiceConfig) -> Result<Bytes, SpeechError>;
        fn is_available(&self) -> bool;
        fn format(&self) -> AudioFormat;
        fn name(&self) -> &str;
    }
}

fn available_engine() -> MockEngine {
    let mut engine = MockEngine::new();
    engine.expect_is_available().return_const(true);
    engine.expect_name().return_const("mock".to_string());
    engine.expect_format().return_const(AudioFormat::Wav);
    engine
}

#[tokio::test]
async fn test_repeated_phrase_hits_cache() {
    let mut engine = available_engine();
    engine
        .expect_synthesize()
        .times(1)
        .returning(|text, _| Ok(Bytes::from(format!("audio:{}", text))));

    let synth = SpeechSynthesizer::with_engine(SpeechConfig::default(), Arc::new(engine)).unwrap();

    let first = synth.speak("Atención, persona adelante").await.unwrap();
    let second = synth.speak("Atención, persona adelante").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(synth.cached_phrases(), 1);
}

#[tokio::test]
async fn test_cache_evicts_oldest() {
    let mut engine = available_engine();
    engine
        .expect_synthesize()
        .times(4)
        .returning(|text, _| Ok(Bytes::from(text.to_string())));

    let mut config = SpeechConfig::default();
    config.max_cache_entries = 2;
    let synth = SpeechSynthesizer::with_engine(config, Arc::new(engine)).unwrap();

    synth.speak("uno").await.unwrap();
    synth.speak("dos").await.unwrap();
    synth.speak("tres").await.unwrap();
    assert_eq!(synth.cached_phrases(), 2);

    // "uno" was evicted, so the engine runs again (4th call)
    synth.speak("uno").await.unwrap();
    // "tres" is still cached
    synth.speak("tres").await.unwrap();
}

#[tokio::test]
async fn test_cache_disabled_always_synthesizes() {
    let mut engine = available_engine();
    engine
        .expect_synthesize()
        .times(2)
        .returning(|_, _| Ok(Bytes::from_static(b"audio")));

    let mut config = SpeechConfig::default();
    config.enable_cache = false;
    let synth = SpeechSynthesizer::with_engine(config, Arc::new(engine)).unwrap();

    synth.speak("Hola").await.unwrap();
    synth.speak("Hola").await.unwrap();
    assert_eq!(synth.cached_phrases(), 0);
}

#[tokio::test]
async fn test_engine_errors_are_not_cached() {
    let mut engine = available_engine();
    let mut calls = 0;
    engine.expect_synthesize().times(2).returning(move |_, _| {
        calls += 1;
        if calls == 1 {
            Err(SpeechError::Engine("busy".to_string()))
        } else {
            Ok(Bytes::from_static(b"audio"))
        }
    });

    let synth = SpeechSynthesizer::with_engine(SpeechConfig::default(), Arc::new(engine)).unwrap();

    assert!(synth.speak("Hola").await.is_err());
    assert_eq!(synth.cached_phrases(), 0);
    assert!(synth.speak("Hola").await.is_ok());
    assert_eq!(synth.cached_phrases(), 1);
}

#[tokio::test]
async fn test_empty_audio_is_rejected() {
    let mut engine = available_engine();
    engine.expect_synthesize().returning(|_, _| Ok(Bytes::new()));

    let synth = SpeechSynthesizer::with_engine(SpeechConfig::default(), Arc::new(engine)).unwrap();
    let result = synth.speak("Hola").await;
    assert!(matches!(result, Err(SpeechError::Synthesizer(_))));
}

#[test]
fn test_unavailable_engine_is_rejected() {
    let mut engine = MockEngine::new();
    engine.expect_is_available().return_const(false);
    engine.expect_name().return_const("offline".to_string());

    let result = SpeechSynthesizer::with_engine(SpeechConfig::default(), Arc::new(engine));
    assert!(matches!(result, Err(SpeechError::Engine(msg)) if msg.contains("offline")));
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = SpeechConfig::default();
    config.volume = 2.0;
    let result = SpeechSynthesizer::with_engine(config, Arc::new(available_engine()));
    assert!(matches!(result, Err(SpeechError::Config(_))));
}

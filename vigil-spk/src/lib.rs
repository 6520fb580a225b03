//! vigil-spk: rendering alerts as audio
//!
//! Provides the two alert channels of the pipeline:
//! - Speech: text-to-speech engines (command line or HTTP API) behind a cached synthesizer
//! - Tone: danger score mapped to pitch/volume/interval and rendered as a WAV beep
//!
//! Both implement [`AlertChannel`], so the dispatcher never cares which one is active.

pub mod beeper;
pub mod channel;
pub mod config;
pub mod engines;
pub mod error;
pub mod sink;
pub mod synthesizer;
pub mod tone;

pub use beeper::Beeper;
pub use channel::{select_channel, AlertChannel, RenderOutcome, SilentChannel, SpeechChannel, ToneChannel};
pub use config::{SpeechConfig, TtsEngineKind, VoiceConfig};
pub use engines::{AudioFormat, TtsEngine};
pub use error::SpeechError;
pub use sink::{AudioSink, CommandSink, DirectorySink, NullSink};
pub use synthesizer::SpeechSynthesizer;
pub use tone::{ToneMapper, ToneParameters, ToneSynthesizer};

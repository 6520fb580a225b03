//! vigil-core: shared building blocks for the vigil alert pipeline
//!
//! Holds the data model every other crate speaks:
//! - Detections coming from the (external) object detector
//! - Danger levels, assessments and alert candidates
//! - The core error type and the pipeline configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ChannelKind, CooldownConfig, DispatcherConfig, MessageTemplates, ProximityThresholds,
    ScoringConfig, ToneConfig, VigilConfig,
};
pub use error::{Error, Result};
pub use types::{AlertCandidate, Assessment, BoundingBox, DangerLevel, Detection};

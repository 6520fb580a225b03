//! vigil-llm: scene descriptions from a remote text-generation service
//!
//! The alert pipeline never waits on this crate. Descriptions are asked for
//! on demand and spoken through the dispatcher like any other announcement.

pub mod config;
pub mod describer;
pub mod error;
pub mod providers;


pub use config::SceneConfig;
pub use describer::{parse_response, SceneDescriber, SceneDescription};
pub use error::{Result, SceneError};
pub use providers::{GoogleProvider, SceneProvider};

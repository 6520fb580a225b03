//! vigil-alert: deciding when and in what order alerts are heard
//!
//! - [`CooldownGate`]: per-key and per-message rate limiting
//! - [`AlertDispatcher`]: bounded priority queue drained by one worker task
//! - [`PipelineCoordinator`]: per-frame scoring, gating and dispatch
//! - [`StatusBoard`]: latest danger level and message for the UI

pub mod cooldown;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod status;

pub use cooldown::{CooldownGate, CooldownState, GateDecision, SuppressReason};
pub use dispatcher::{AlertDispatcher, DispatcherStats, ShutdownReport, SubmitOutcome};
pub use error::AlertError;
pub use pipeline::{FrameOutcome, PipelineCoordinator};
pub use status::{StatusBoard, StatusSnapshot};

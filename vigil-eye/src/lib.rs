//! vigil-eye: turning detections into danger assessments
//!
//! The object detector itself is an external collaborator. This crate takes
//! its per-frame output and produces:
//! - A danger score, level and spoken message per detection
//! - A ranking of the frame's assessments (most dangerous first)
//! - Short textual summaries for the scene-description service

pub mod error;
pub mod frame;
pub mod ranking;
pub mod scoring;

pub use error::VisionError;
pub use frame::{FrameDetections, RawDetection};
pub use ranking::{detections_summary, rank_assessments};
pub use scoring::ScoreEngine;

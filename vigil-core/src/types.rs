//! Data model shared across the pipeline

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Source key used for announcements that do not come from a detection
pub const SYSTEM_SOURCE_KEY: &str = "system";

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Check that the corners are finite and ordered
    pub fn validate(&self) -> Result<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidArgument("Bounding box has non-finite coordinates".to_string()));
        }
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(Error::InvalidArgument(format!(
                "Bounding box corners out of order: ({}, {}) -> ({}, {})",
                self.x1, self.y1, self.x2, self.y2
            )));
        }
        Ok(())
    }
}

/// One recognized object instance in a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class label (e.g. "car")
    pub class_name: String,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Box center in pixels
    pub center: (f32, f32),
    /// Box area divided by frame area, in (0, 1]
    pub relative_area: f32,
}

impl Detection {
    /// Build a detection from a raw detector box, deriving center and relative area
    pub fn from_box(
        class_name: impl Into<String>,
        confidence: f32,
        bbox: BoundingBox,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self> {
        bbox.validate()?;
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidArgument(format!(
                "Frame size must be positive, got {}x{}",
                frame_width, frame_height
            )));
        }

        let frame_area = frame_width as f32 * frame_height as f32;
        let relative_area = (bbox.area() / frame_area).min(1.0);

        let detection = Self {
            class_name: class_name.into(),
            confidence,
            bbox,
            center: bbox.center(),
            relative_area,
        };
        detection.validate()?;
        Ok(detection)
    }

    pub fn validate(&self) -> Result<()> {
        if self.class_name.is_empty() {
            return Err(Error::InvalidArgument("Detection class name cannot be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidArgument(format!(
                "Detection confidence must be in [0, 1], got {}",
                self.confidence
            )));
        }
        if !(self.relative_area > 0.0 && self.relative_area <= 1.0) {
            return Err(Error::InvalidArgument(format!(
                "Relative area must be in (0, 1], got {}",
                self.relative_area
            )));
        }
        Ok(())
    }
}

/// Coarse danger classification derived from a continuous score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DangerLevel {
    /// Nothing detected in the frame
    None,
    Low,
    Medium,
    High,
}

impl DangerLevel {
    pub const HIGH_THRESHOLD: f64 = 60.0;
    pub const MEDIUM_THRESHOLD: f64 = 30.0;

    /// Step function of the score. Never yields `None`: that level only
    /// describes a frame without detections.
    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            DangerLevel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            DangerLevel::Medium
        } else {
            DangerLevel::Low
        }
    }

    /// Dispatch priority band, lower is served first
    pub fn priority(&self) -> u8 {
        match self {
            DangerLevel::High => 0,
            DangerLevel::Medium => 1,
            DangerLevel::Low | DangerLevel::None => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DangerLevel::None => "NONE",
            DangerLevel::Low => "LOW",
            DangerLevel::Medium => "MEDIUM",
            DangerLevel::High => "HIGH",
        }
    }
}

impl Default for DangerLevel {
    fn default() -> Self {
        DangerLevel::None
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored view of one detection, recomputed every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub detection: Detection,
    pub danger_level: DangerLevel,
    /// Always within [0, 100]
    pub danger_score: f64,
    pub message: String,
}

/// An alert that passed the cooldown gate and waits to be rendered
#[derive(Debug, Clone)]
pub struct AlertCandidate {
    pub id: Uuid,
    pub message: String,
    pub source_key: String,
    /// Lower is more urgent
    pub priority: u8,
    pub level: DangerLevel,
    pub danger_score: f64,
    pub timestamp: Instant,
}

impl AlertCandidate {
    pub fn new(
        message: impl Into<String>,
        source_key: impl Into<String>,
        level: DangerLevel,
        danger_score: f64,
        timestamp: Instant,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            source_key: source_key.into(),
            priority: level.priority(),
            level,
            danger_score: danger_score.clamp(0.0, 100.0),
            timestamp,
        }
    }

    /// Candidate built from an assessment, keyed by the object class
    pub fn from_assessment(assessment: &Assessment, timestamp: Instant) -> Self {
        Self::new(
            assessment.message.clone(),
            assessment.detection.class_name.clone(),
            assessment.danger_level,
            assessment.danger_score,
            timestamp,
        )
    }

    /// Announcement from the system itself (start, stop, scene descriptions)
    pub fn system(message: impl Into<String>, timestamp: Instant) -> Self {
        Self::new(message, SYSTEM_SOURCE_KEY, DangerLevel::High, 100.0, timestamp)
    }
}

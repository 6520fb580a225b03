//! Per-frame detector output as it arrives from the detector process

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use tracing::warn;
use vigil_core::{BoundingBox, Detection};

/// Box as reported by the detector, before geometry is derived
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// One frame worth of detections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl FrameDetections {
    pub fn empty(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            detections: Vec::new(),
        }
    }

    /// Reject frames whose size makes every box meaningless
    pub fn validate(&self) -> Result<(), VisionError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(VisionError::InvalidArgument(format!(
                "Frame size must be positive, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        Ok(())
    }

    /// Derive center and relative area for every box. Malformed boxes are
    /// dropped so one bad record never stalls the frame.
    pub fn to_detections(&self) -> Vec<Detection> {
        self.detections
            .iter()
            .filter_map(|raw| {
                match Detection::from_box(
                    raw.class_name.clone(),
                    raw.confidence,
                    raw.bbox,
                    self.frame_width,
                    self.frame_height,
                ) {
                    Ok(detection) => Some(detection),
                    Err(e) => {
                        warn!("Dropping malformed detection '{}': {}", raw.class_name, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_json() {
        let frame: FrameDetections = serde_json::from_str(
            r#"{"frame_width": 640, "frame_height": 480,
                "detections": [{"class_name": "car", "confidence": 0.9,
                                "bbox": {"x1": 220.0, "y1": 100.0, "x2": 420.0, "y2": 400.0}}]}"#,
        )
        .unwrap();
        let detections = frame.to_detections();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].center, (320.0, 250.0));
    }

    #[test]
    fn test_missing_detections_is_empty_frame() {
        let frame: FrameDetections = serde_json::from_str(r#"{"frame_width": 640, "frame_height": 480}"#).unwrap();
        assert!(frame.to_detections().is_empty());
    }

    #[test]
    fn test_zero_sized_frame_is_invalid() {
        assert!(FrameDetections::empty(640, 480).validate().is_ok());
        assert!(matches!(
            FrameDetections::empty(0, 480).validate(),
            Err(VisionError::InvalidArgument(_))
        ));
        assert!(FrameDetections::empty(640, 0).validate().is_err());
    }

    #[test]
    fn test_malformed_box_is_dropped() {
        let mut frame = FrameDetections::empty(640, 480);
        frame.detections.push(RawDetection {
            class_name: "car".to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(400.0, 100.0, 200.0, 300.0),
        });
        frame.detections.push(RawDetection {
            class_name: "dog".to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(0.0, 0.0, 64.0, 48.0),
        });
        let detections = frame.to_detections();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "dog");
    }
}

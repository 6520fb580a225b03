//! Danger scoring of single detections

use crate::error::VisionError;
use crate::ranking::rank_assessments;
use tracing::debug;
use vigil_core::config::ScoringConfig;
use vigil_core::{Assessment, DangerLevel, Detection};

/// Multiplier tiers, matched against the configured proximity thresholds
const VERY_CLOSE_MULTIPLIER: f64 = 10.0;
const CLOSE_MULTIPLIER: f64 = 6.0;
const MEDIUM_MULTIPLIER: f64 = 3.0;
const FAR_MULTIPLIER: f64 = 1.0;

pub const MAX_SCORE: f64 = 100.0;

/// Stateless scorer: detection + frame width -> assessment
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one detection.
    ///
    /// Returns `Ok(None)` when the detection is below the confidence floor.
    /// Fails only when `frame_width` is zero.
    pub fn assess(&self, detection: &Detection, frame_width: u32) -> Result<Option<Assessment>, VisionError> {
        if frame_width == 0 {
            return Err(VisionError::InvalidArgument("Frame width must be positive".to_string()));
        }

        if detection.confidence < self.config.min_confidence {
            debug!(
                "Skipping {} with confidence {:.2} (min {:.2})",
                detection.class_name, detection.confidence, self.config.min_confidence
            );
            return Ok(None);
        }

        let base = self.base_weight(&detection.class_name) as f64;
        let proximity = self.proximity_multiplier(detection.relative_area);
        let position = position_multiplier(detection.center.0, frame_width);

        let danger_score = clamp_score(base * proximity * position);
        let danger_level = DangerLevel::from_score(danger_score);
        let message = self.message_for(danger_level, &detection.class_name);

        Ok(Some(Assessment {
            detection: detection.clone(),
            danger_level,
            danger_score,
            message,
        }))
    }

    /// Score every detection of a frame and rank the results, most dangerous first
    pub fn assess_frame(&self, detections: &[Detection], frame_width: u32) -> Result<Vec<Assessment>, VisionError> {
        let mut assessments = Vec::with_capacity(detections.len());
        for detection in detections {
            if let Some(assessment) = self.assess(detection, frame_width)? {
                assessments.push(assessment);
            }
        }
        Ok(rank_assessments(assessments))
    }

    /// Base weight from the danger table, default for unknown classes
    pub fn base_weight(&self, class_name: &str) -> u32 {
        self.config
            .danger_weights
            .get(class_name)
            .copied()
            .unwrap_or(self.config.default_weight)
    }

    /// Step function of the box's share of the frame
    pub fn proximity_multiplier(&self, relative_area: f32) -> f64 {
        let thresholds = &self.config.proximity;
        if relative_area >= thresholds.very_close {
            VERY_CLOSE_MULTIPLIER
        } else if relative_area >= thresholds.close {
            CLOSE_MULTIPLIER
        } else if relative_area >= thresholds.medium {
            MEDIUM_MULTIPLIER
        } else {
            FAR_MULTIPLIER
        }
    }

    /// Spoken name of a class, the raw label when untranslated
    pub fn spoken_name<'a>(&'a self, class_name: &'a str) -> &'a str {
        self.config
            .translations
            .get(class_name)
            .map(String::as_str)
            .unwrap_or(class_name)
    }

    pub fn message_for(&self, level: DangerLevel, class_name: &str) -> String {
        let templates = &self.config.templates;
        let template = match level {
            DangerLevel::High => &templates.high,
            DangerLevel::Medium => &templates.medium,
            DangerLevel::Low | DangerLevel::None => &templates.low,
        };
        template.replace("{object}", self.spoken_name(class_name))
    }
}

/// 1.5 when the object is dead ahead, falling linearly to 1.0 at the frame edges
pub fn position_multiplier(center_x: f32, frame_width: u32) -> f64 {
    let normalized = (center_x as f64 / frame_width as f64).clamp(0.0, 1.0);
    1.5 - (normalized - 0.5).abs()
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::BoundingBox;

    fn engine() -> ScoreEngine {
        ScoreEngine::new(ScoringConfig::default()).unwrap()
    }

    fn detection(class_name: &str, relative_area: f32, center_x: f32) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(center_x - 10.0, 100.0, center_x + 10.0, 200.0),
            center: (center_x, 150.0),
            relative_area,
        }
    }

    #[test]
    fn test_proximity_tiers() {
        let engine = engine();
        assert_eq!(engine.proximity_multiplier(0.15), 10.0);
        assert_eq!(engine.proximity_multiplier(0.9), 10.0);
        assert_eq!(engine.proximity_multiplier(0.149), 6.0);
        assert_eq!(engine.proximity_multiplier(0.08), 6.0);
        assert_eq!(engine.proximity_multiplier(0.079), 3.0);
        assert_eq!(engine.proximity_multiplier(0.03), 3.0);
        assert_eq!(engine.proximity_multiplier(0.029), 1.0);
        assert_eq!(engine.proximity_multiplier(0.001), 1.0);
    }

    #[test]
    fn test_position_multiplier() {
        assert_eq!(position_multiplier(320.0, 640), 1.5);
        assert_eq!(position_multiplier(0.0, 640), 1.0);
        assert_eq!(position_multiplier(640.0, 640), 1.0);
        assert!((position_multiplier(160.0, 640) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_centered_close_car_is_high() {
        let assessment = engine().assess(&detection("car", 0.2, 320.0), 640).unwrap().unwrap();
        assert_eq!(assessment.danger_score, 100.0);
        assert_eq!(assessment.danger_level, DangerLevel::High);
        assert_eq!(assessment.message, "¡Cuidado! carro muy cerca, peligro alto");
    }

    #[test]
    fn test_unknown_class_uses_default_weight_and_raw_label() {
        let engine = engine();
        let assessment = engine.assess(&detection("traffic cone", 0.2, 320.0), 640).unwrap().unwrap();
        // 1 * 10 * 1.5
        assert_eq!(assessment.danger_score, 15.0);
        assert_eq!(assessment.danger_level, DangerLevel::Low);
        assert_eq!(assessment.message, "traffic cone detectado a distancia");
    }

    #[test]
    fn test_medium_level_message() {
        // person: 5 * 6 * 1.5 = 45
        let assessment = engine().assess(&detection("person", 0.1, 320.0), 640).unwrap().unwrap();
        assert_eq!(assessment.danger_score, 45.0);
        assert_eq!(assessment.danger_level, DangerLevel::Medium);
        assert_eq!(assessment.message, "Atención, persona adelante");
    }

    #[test]
    fn test_zero_width_is_invalid_argument() {
        let result = engine().assess(&detection("car", 0.2, 320.0), 0);
        assert!(matches!(result, Err(VisionError::InvalidArgument(_))));
    }

    #[test]
    fn test_low_confidence_is_skipped() {
        let mut det = detection("car", 0.2, 320.0);
        det.confidence = 0.3;
        assert!(engine().assess(&det, 640).unwrap().is_none());
    }

    #[test]
    fn test_assess_frame_ranks_by_score() {
        let engine = engine();
        let detections = vec![
            detection("backpack", 0.01, 10.0),
            detection("car", 0.2, 320.0),
            detection("person", 0.1, 320.0),
        ];
        let ranked = engine.assess_frame(&detections, 640).unwrap();
        let classes: Vec<_> = ranked.iter().map(|a| a.detection.class_name.as_str()).collect();
        assert_eq!(classes, vec!["car", "person", "backpack"]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ScoringConfig::default();
        config.default_weight = 0;
        assert!(matches!(ScoreEngine::new(config), Err(VisionError::Config(_))));
    }
}

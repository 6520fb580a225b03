//! Ordering and summarising a frame's assessments

use vigil_core::Assessment;

/// Default number of objects mentioned in a summary
pub const DEFAULT_SUMMARY_OBJECTS: usize = 8;

/// Sort by descending score. The sort is stable, so equal scores keep
/// the detector's output order and the earliest one stays in front.
pub fn rank_assessments(mut assessments: Vec<Assessment>) -> Vec<Assessment> {
    assessments.sort_by(|a, b| b.danger_score.total_cmp(&a.danger_score));
    assessments
}

/// Comma separated class names of the first `max_objects` assessments
pub fn detections_summary(assessments: &[Assessment], max_objects: usize) -> String {
    assessments
        .iter()
        .take(max_objects)
        .map(|a| a.detection.class_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{BoundingBox, DangerLevel, Detection};

    fn assessment(class_name: &str, score: f64) -> Assessment {
        Assessment {
            detection: Detection {
                class_name: class_name.to_string(),
                confidence: 0.8,
                bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                center: (5.0, 5.0),
                relative_area: 0.01,
            },
            danger_level: DangerLevel::from_score(score),
            danger_score: score,
            message: String::new(),
        }
    }

    #[test]
    fn test_ties_keep_detector_order() {
        let ranked = rank_assessments(vec![
            assessment("dog", 30.0),
            assessment("car", 90.0),
            assessment("cat", 30.0),
        ]);
        let classes: Vec<_> = ranked.iter().map(|a| a.detection.class_name.as_str()).collect();
        assert_eq!(classes, vec!["car", "dog", "cat"]);
    }

    #[test]
    fn test_summary_limits_objects() {
        let assessments: Vec<_> = (0..10).map(|i| assessment(&format!("obj{}", i), 10.0)).collect();
        let summary = detections_summary(&assessments, DEFAULT_SUMMARY_OBJECTS);
        assert_eq!(summary.split(", ").count(), 8);
        assert!(summary.starts_with("obj0, obj1"));
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(detections_summary(&[], DEFAULT_SUMMARY_OBJECTS), "");
    }
}

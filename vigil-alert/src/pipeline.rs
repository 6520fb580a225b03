//! Per-frame orchestration: score, gate, dispatch, beep

use crate::cooldown::{CooldownGate, GateDecision};
use crate::dispatcher::{AlertDispatcher, SubmitOutcome};
use crate::error::AlertError;
use crate::status::StatusBoard;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use vigil_core::{AlertCandidate, Assessment, DangerLevel, Detection, VigilConfig};
use vigil_eye::{FrameDetections, ScoreEngine};
use vigil_spk::{AlertChannel, AudioSink, Beeper, ToneParameters};

/// What one frame did
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    pub level: DangerLevel,
    /// All assessments of the frame, most dangerous first
    pub assessments: Vec<Assessment>,
    /// Gate verdict for the top assessment
    pub decision: Option<GateDecision>,
    /// Dispatcher verdict when the gate let the alert through
    pub submitted: Option<SubmitOutcome>,
    /// Beep played on the tone path this frame
    pub tone: Option<ToneParameters>,
}

impl FrameOutcome {
    pub fn top(&self) -> Option<&Assessment> {
        self.assessments.first()
    }
}

/// Glue between the frame source and the alert outputs.
///
/// Every method is synchronous and returns without waiting on audio.
pub struct PipelineCoordinator {
    engine: ScoreEngine,
    gate: CooldownGate,
    dispatcher: Arc<AlertDispatcher>,
    beeper: Option<Mutex<Beeper>>,
    status: StatusBoard,
}

impl PipelineCoordinator {
    pub fn new(engine: ScoreEngine, gate: CooldownGate, dispatcher: Arc<AlertDispatcher>, status: StatusBoard) -> Self {
        Self {
            engine,
            gate,
            dispatcher,
            beeper: None,
            status,
        }
    }

    /// Feed every frame's top score to a beeper as well
    pub fn with_beeper(mut self, beeper: Beeper) -> Self {
        self.beeper = Some(Mutex::new(beeper));
        self
    }

    /// Build the whole pipeline from configuration.
    ///
    /// The dispatcher is created but not started. A beeper that cannot be
    /// built is left out with a warning.
    pub fn from_config(
        config: &VigilConfig,
        channel: Arc<dyn AlertChannel>,
        sink: Arc<dyn AudioSink>,
    ) -> Result<Self, AlertError> {
        config.validate().map_err(AlertError::Config)?;

        let status = StatusBoard::new();
        let engine = ScoreEngine::new(config.scoring.clone())?;
        let gate = CooldownGate::new(config.cooldown.clone())?;
        let dispatcher = Arc::new(AlertDispatcher::new(config.dispatcher.clone(), channel, status.clone())?);

        let mut coordinator = Self::new(engine, gate, dispatcher, status);
        if config.tone.enabled {
            match Beeper::new(&config.tone, sink) {
                Ok(beeper) => coordinator = coordinator.with_beeper(beeper),
                Err(e) => warn!("Tone path disabled: {}", e),
            }
        }
        Ok(coordinator)
    }

    /// A zero-sized frame is an error and leaves the status untouched
    pub fn process_frame(&self, frame: &FrameDetections, now: Instant) -> Result<FrameOutcome, AlertError> {
        frame.validate()?;
        let detections = frame.to_detections();
        self.process_detections(&detections, frame.frame_width, now)
    }

    /// Score all detections, then alert on the most dangerous one.
    ///
    /// Ties on score go to the detection that came first.
    pub fn process_detections(
        &self,
        detections: &[Detection],
        frame_width: u32,
        now: Instant,
    ) -> Result<FrameOutcome, AlertError> {
        let assessments = self.engine.assess_frame(detections, frame_width)?;

        let Some(top) = assessments.first() else {
            self.status.set_level(DangerLevel::None);
            return Ok(FrameOutcome::default());
        };

        let level = top.danger_level;
        self.status.set_level(level);

        let tone = self
            .beeper
            .as_ref()
            .and_then(|beeper| beeper.lock().update(top.danger_score, now));

        let source_key = top.detection.class_name.as_str();
        let decision = self.gate.evaluate(&top.message, source_key, top.danger_score, now);

        let submitted = decision
            .is_emit()
            .then(|| self.dispatcher.submit(AlertCandidate::from_assessment(top, now)));

        debug!(
            "Frame: {} assessments, top '{}' {:.1} ({}), decision {:?}",
            assessments.len(),
            source_key,
            top.danger_score,
            level,
            decision
        );

        Ok(FrameOutcome {
            level,
            decision: Some(decision),
            submitted,
            tone,
            assessments,
        })
    }

    /// Queue a system message at the highest priority, bypassing the gate
    pub fn announce(&self, text: &str, now: Instant) -> SubmitOutcome {
        info!("Announcement: {}", text);
        self.dispatcher.submit(AlertCandidate::system(text, now))
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn dispatcher(&self) -> &Arc<AlertDispatcher> {
        &self.dispatcher
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    pub fn has_beeper(&self) -> bool {
        self.beeper.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::config::{CooldownConfig, DispatcherConfig, ScoringConfig};
    use vigil_core::BoundingBox;
    use vigil_spk::SilentChannel;

    fn coordinator() -> PipelineCoordinator {
        let status = StatusBoard::new();
        let dispatcher = AlertDispatcher::new(DispatcherConfig::default(), Arc::new(SilentChannel), status.clone()).unwrap();
        PipelineCoordinator::new(
            ScoreEngine::new(ScoringConfig::default()).unwrap(),
            CooldownGate::new(CooldownConfig::default()).unwrap(),
            Arc::new(dispatcher),
            status,
        )
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
    fn test_tie_goes_to_first_detection() {
        let coordinator = coordinator();
        let detections = vec![detection("truck", 0.2, 320.0), detection("car", 0.2, 320.0)];
        let outcome = coordinator.process_detections(&detections, 640, Instant::now()).unwrap();
        assert_eq!(outcome.top().map(|a| a.detection.class_name.as_str()), Some("truck"));
    }

    #[test]
    fn test_zero_width_is_error() {
        let coordinator = coordinator();
        let result = coordinator.process_detections(&[detection("car", 0.2, 320.0)], 0, Instant::now());
        assert!(matches!(result, Err(AlertError::Vision(_))));
    }

    #[test]
    fn test_zero_width_frame_is_error() {
        let coordinator = coordinator();
        coordinator.status().set_level(DangerLevel::High);

        let mut frame = FrameDetections::empty(0, 480);
        frame.detections.push(vigil_eye::RawDetection {
            class_name: "car".to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(192.0, 120.0, 448.0, 360.0),
        });

        let result = coordinator.process_frame(&frame, Instant::now());
        assert!(matches!(result, Err(AlertError::Vision(_))));
        assert_eq!(coordinator.status().danger_level(), DangerLevel::High);
        assert_eq!(coordinator.dispatcher().pending(), 0);
    }

    #[test]
    fn test_announce_bypasses_gate() {
        let coordinator = coordinator();
        let now = Instant::now();
        assert_eq!(coordinator.announce("Sistema iniciado", now), SubmitOutcome::Queued);
        assert_eq!(coordinator.announce("Sistema iniciado", now), SubmitOutcome::Queued);
        assert_eq!(coordinator.dispatcher().pending(), 2);
        assert!(coordinator.gate().snapshot().is_empty());
    }
}

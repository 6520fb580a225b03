//! Rate limiting of alerts per source key and per message text

use crate::error::AlertError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use vigil_core::config::CooldownConfig;

/// Everything the gate remembers between calls.
///
/// Owned by one [`CooldownGate`]; build one by hand to start a gate from a
/// known history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooldownState {
    last_emission: HashMap<String, Instant>,
    last_message: Option<(String, Instant)>,
}

impl CooldownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an emission as if the gate had let it through
    pub fn record(&mut self, message: &str, source_key: &str, now: Instant) {
        self.last_emission.insert(source_key.to_string(), now);
        self.last_message = Some((message.to_string(), now));
    }

    pub fn last_emission(&self, source_key: &str) -> Option<Instant> {
        self.last_emission.get(source_key).copied()
    }

    pub fn last_message(&self) -> Option<(&str, Instant)> {
        self.last_message.as_ref().map(|(text, at)| (text.as_str(), *at))
    }

    pub fn is_empty(&self) -> bool {
        self.last_emission.is_empty() && self.last_message.is_none()
    }
}

/// Why a candidate was held back
#[derive(Debug, Clone, PartialEq)]
pub enum SuppressReason {
    BelowThreshold { score: f64, min_score: f64 },
    KeyCooldown { source_key: String, remaining: Duration },
    RepeatedMessage { remaining: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Emit,
    Suppress(SuppressReason),
}

impl GateDecision {
    pub fn is_emit(&self) -> bool {
        matches!(self, GateDecision::Emit)
    }
}

/// Stateful pass/suppress filter in front of the dispatcher
pub struct CooldownGate {
    config: CooldownConfig,
    state: Mutex<CooldownState>,
}

impl CooldownGate {
    pub fn new(config: CooldownConfig) -> Result<Self, AlertError> {
        Self::with_state(config, CooldownState::default())
    }

    pub fn with_state(config: CooldownConfig, state: CooldownState) -> Result<Self, AlertError> {
        config.validate().map_err(AlertError::Config)?;
        Ok(Self {
            config,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &CooldownConfig {
        &self.config
    }

    /// Decide whether an alert may be emitted at `now`.
    ///
    /// Check and update happen under one lock, so two concurrent callers
    /// with the same key can never both pass.
    pub fn evaluate(&self, message: &str, source_key: &str, danger_score: f64, now: Instant) -> GateDecision {
        // NaN never passes
        if !(danger_score >= self.config.min_danger_score) {
            debug!(
                "Suppressed '{}': score {:.1} below {:.1}",
                source_key, danger_score, self.config.min_danger_score
            );
            return GateDecision::Suppress(SuppressReason::BelowThreshold {
                score: danger_score,
                min_score: self.config.min_danger_score,
            });
        }

        let mut state = self.state.lock();

        let window = self.config.window();
        if let Some(last) = state.last_emission(source_key) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < window {
                debug!("Suppressed '{}': key cooldown ({:?} elapsed)", source_key, elapsed);
                return GateDecision::Suppress(SuppressReason::KeyCooldown {
                    source_key: source_key.to_string(),
                    remaining: window - elapsed,
                });
            }
        }

        let repeat_window = self.config.repeat_window();
        if let Some((last_text, last_at)) = state.last_message() {
            let elapsed = now.saturating_duration_since(last_at);
            if last_text == message && elapsed < repeat_window {
                debug!("Suppressed '{}': repeated message ({:?} elapsed)", source_key, elapsed);
                return GateDecision::Suppress(SuppressReason::RepeatedMessage {
                    remaining: repeat_window - elapsed,
                });
            }
        }

        state.record(message, source_key, now);
        GateDecision::Emit
    }

    /// Forget all history
    pub fn reset(&self) {
        *self.state.lock() = CooldownState::default();
    }

    pub fn snapshot(&self) -> CooldownState {
        self.state.lock().clone()
    }
}

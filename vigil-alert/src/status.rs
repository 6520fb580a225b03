//! Current danger level and last rendered message, for the UI

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use vigil_core::DangerLevel;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub danger_level: DangerLevel,
    pub last_message: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Latest-value publication of the pipeline status.
///
/// Cheap to clone; subscribers only ever see the most recent snapshot.
#[derive(Clone)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<StatusSnapshot>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(StatusSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    pub fn danger_level(&self) -> DangerLevel {
        self.tx.borrow().danger_level
    }

    /// Publish the frame's level. Subscribers are only woken on change.
    pub fn set_level(&self, level: DangerLevel) {
        self.tx.send_if_modified(|status| {
            if status.danger_level == level {
                return false;
            }
            status.danger_level = level;
            status.updated_at = Some(Utc::now());
            true
        });
    }

    pub fn set_last_message(&self, message: &str) {
        self.tx.send_modify(|status| {
            status.last_message = Some(message.to_string());
            status.updated_at = Some(Utc::now());
        });
    }
}

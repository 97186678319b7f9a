//! Event types for the SFP event system
//!
//! Provides shared event definitions and the EventBus used by the forecast
//! pipeline to publish upload, stage and notification updates.

mod notification;

pub use notification::Notification;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// SFP event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag so a
/// presentation layer can consume them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ForecastEvent {
    /// Simulated transfer progress for one file (0-100, steps of 10)
    UploadProgress {
        file_name: String,
        percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// A candidate file was refused by the acceptance policy
    FileRejected {
        file_name: String,
        /// Display form of the rejection reason
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Committed file sequence changed (batch finished or file removed)
    FilesChanged {
        file_names: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A processing stage began
    StageStarted {
        run_id: Uuid,
        /// 0-based stage index
        ordinal: usize,
        label: String,
        /// Cumulative percent reached when this stage finishes
        target_percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// Run progress tick
    ///
    /// Emitted once per percent. Lossy: nobody has to listen.
    RunProgress {
        run_id: Uuid,
        percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// Run reached the completed terminal state
    RunCompleted {
        run_id: Uuid,
        wmape: f64,
        total_predictions: u64,
        timestamp: DateTime<Utc>,
    },

    /// Run reached the failed terminal state
    RunFailed {
        run_id: Uuid,
        diagnostic: String,
        timestamp: DateTime<Utc>,
    },

    /// Run state returned to idle because the file set no longer qualifies
    RunReset {
        timestamp: DateTime<Utc>,
    },

    /// User-facing notification (toast)
    Notification {
        #[serde(flatten)]
        notification: Notification,
        timestamp: DateTime<Utc>,
    },
}

impl ForecastEvent {
    pub fn notification(notification: Notification) -> Self {
        ForecastEvent::Notification {
            notification,
            timestamp: Utc::now(),
        }
    }

    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            ForecastEvent::UploadProgress { .. } => "UploadProgress",
            ForecastEvent::FileRejected { .. } => "FileRejected",
            ForecastEvent::FilesChanged { .. } => "FilesChanged",
            ForecastEvent::StageStarted { .. } => "StageStarted",
            ForecastEvent::RunProgress { .. } => "RunProgress",
            ForecastEvent::RunCompleted { .. } => "RunCompleted",
            ForecastEvent::RunFailed { .. } => "RunFailed",
            ForecastEvent::RunReset { .. } => "RunReset",
            ForecastEvent::Notification { .. } => "Notification",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use sfp_common::events::{EventBus, ForecastEvent, Notification};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ForecastEvent::notification(Notification::upload_complete()));
///
/// match rx.try_recv() {
///     Ok(ForecastEvent::Notification { notification, .. }) => {
///         assert_eq!(notification.title, "Files uploaded successfully!");
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ForecastEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// A run emits roughly one event per percent plus eleven per uploaded
    /// file, so 256 is comfortable for a single host subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ForecastEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ForecastEvent,
    ) -> Result<usize, broadcast::error::SendError<ForecastEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ForecastEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        let result = bus.emit(ForecastEvent::RunReset { timestamp: Utc::now() });
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_receives_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(ForecastEvent::UploadProgress {
            file_name: "a.parquet".to_string(),
            percent: 0,
            timestamp: Utc::now(),
        });
        bus.emit_lossy(ForecastEvent::UploadProgress {
            file_name: "a.parquet".to_string(),
            percent: 10,
            timestamp: Utc::now(),
        });

        let percents: Vec<u8> = (0..2)
            .map(|_| match rx.try_recv().unwrap() {
                ForecastEvent::UploadProgress { percent, .. } => percent,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(percents, vec![0, 10]);
    }

    #[test]
    fn test_notification_serializes_flat() {
        let event = ForecastEvent::notification(Notification::new("Title", "Body"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Notification");
        assert_eq!(json["title"], "Title");
        assert_eq!(json["description"], "Body");
        assert_eq!(event.event_type(), "Notification");
    }
}

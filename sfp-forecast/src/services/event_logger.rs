//! Event bus logger
//!
//! Drains a bus subscription into the log. Ends once every `EventBus` clone
//! is dropped and the queue is empty, so nothing emitted before shutdown is
//! lost.

use sfp_common::events::ForecastEvent;
use tokio::sync::broadcast::{self, error::RecvError};

/// What a finished logger saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventLogSummary {
    pub events: usize,
    pub notifications: usize,
    /// Events skipped because the subscription fell behind
    pub lagged: u64,
}

/// Log every event from `rx` until the bus closes
///
/// Subscribe before the producers start, or early events are missed.
pub async fn log_events(mut rx: broadcast::Receiver<ForecastEvent>) -> EventLogSummary {
    let mut summary = EventLogSummary::default();
    loop {
        match rx.recv().await {
            Ok(ForecastEvent::Notification { notification, .. }) => {
                summary.events += 1;
                summary.notifications += 1;
                tracing::info!(title = %notification.title, "{}", notification.description);
            }
            Ok(event) => {
                summary.events += 1;
                match serde_json::to_string(&event) {
                    Ok(json) => tracing::debug!(event_type = event.event_type(), "{}", json),
                    Err(e) => {
                        tracing::debug!(event_type = event.event_type(), "Unserializable event: {}", e)
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event logger lagged");
                summary.lagged += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sfp_common::events::{EventBus, Notification};

    #[tokio::test]
    async fn test_drains_queue_after_bus_dropped() {
        let bus = EventBus::new(16);
        let logger = tokio::spawn(log_events(bus.subscribe()));

        bus.emit_lossy(ForecastEvent::RunReset { timestamp: Utc::now() });
        bus.emit_lossy(ForecastEvent::notification(Notification::upload_complete()));
        drop(bus);

        let summary = logger.await.unwrap();
        assert_eq!(
            summary,
            EventLogSummary {
                events: 2,
                notifications: 1,
                lagged: 0
            }
        );
    }

    #[tokio::test]
    async fn test_counts_lagged_events() {
        let bus = EventBus::new(2);
        let rx = bus.subscribe();
        for _ in 0..5 {
            bus.emit_lossy(ForecastEvent::RunReset { timestamp: Utc::now() });
        }
        drop(bus);

        let summary = log_events(rx).await;
        assert_eq!(summary.lagged, 3);
        assert_eq!(summary.events, 2);
    }
}

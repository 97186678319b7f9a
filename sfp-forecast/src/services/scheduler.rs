//! Timed suspension seam
//!
//! Every upload and stage progress tick suspends through a `Scheduler`. The
//! production driver sleeps on the tokio timer; swapping the implementation
//! changes what drives progress without touching the state machines.

use async_trait::async_trait;
use std::time::Duration;

/// Resume the caller after a delay
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspend for `delay`, yielding to other tasks meanwhile
    async fn after(&self, delay: Duration);
}

/// Real-time scheduler backed by `tokio::time::sleep`
///
/// Under `#[tokio::test(start_paused = true)]` this runs on virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn after(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Scheduler that ignores delays but still yields at every tick
///
/// Keeps the interleaving points while skipping the waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn after(&self, _delay: Duration) {
        tokio::task::yield_now().await;
    }
}

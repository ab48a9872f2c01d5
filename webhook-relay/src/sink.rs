//! In-memory event sink.
//!
//! The sink is an append-only, ordered collection shared between request
//! handlers. Appends go through a single write lock, so no event is lost and
//! the stored order is the order in which `record` acquired the lock.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::event::Event;

/// Shared handle to the accepted events.
///
/// Cloning is cheap; all clones see the same sequence.
#[derive(Clone, Default)]
pub struct EventSink {
    inner: Arc<RwLock<Vec<Event>>>,
}

impl EventSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the tail and return its zero-based position.
    pub async fn record(&self, event: Event) -> usize {
        let mut events = self.inner.write().await;
        events.push(event);
        let position = events.len() - 1;

        debug!(position = position, "event_recorded");

        position
    }

    /// Snapshot of every recorded event, in order.
    pub async fn all(&self) -> Vec<Event> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop every recorded event. Intended for tests and resets.
    pub async fn clear(&self) {
        let mut events = self.inner.write().await;
        let cleared = events.len();
        events.clear();

        info!(cleared = cleared, "event_sink_cleared");
    }
}

//! Domain event system — progress reporting decoupled from the wiki loop.
//!
//! Events are published when something interesting happens while a wiki is
//! being built. The CLI subscribes to render progress; tests subscribe to
//! observe the loop without reaching into its state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WikiEvent {
    /// A chunk went through dispatch and the update pass
    ChunkProcessed {
        index: usize,
        tool_calls: usize,
        failed_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// A single tool call was dispatched
    ToolDispatched {
        tool_name: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// A new entity appeared in a section
    EntityCreated {
        section: String,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// An attribute was flushed
    AttributeUpdated {
        section: String,
        entity: String,
        attribute: String,
        /// Number of buffered observations that were consumed
        consumed: usize,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// A snapshot was written to disk
    WikiSaved {
        root: String,
        files: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for wiki events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<WikiEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: WikiEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WikiEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

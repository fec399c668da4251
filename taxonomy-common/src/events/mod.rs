//! Event types for the taxonomy event system
//!
//! Provides shared event definitions and EventBus for the taxonomy services.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Kind of learning product a skill tag can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Course,
    Program,
    XBlock,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Course => write!(f, "course"),
            ProductType::Program => write!(f, "program"),
            ProductType::XBlock => write!(f, "xblock"),
        }
    }
}

/// Taxonomy event types
///
/// Events are broadcast via EventBus; all events use this central enum for
/// type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaxonomyEvent {
    /// A skill tag accumulated enough affirming votes and was verified
    SkillTagVerified {
        /// Vote record id
        record_id: i64,
        /// Skill name (for display and logs)
        skill_name: String,
        /// Usage key of the tagged xblock
        usage_key: String,
        /// When the decision was made
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A skill tag accumulated enough rejecting votes and was blacklisted
    SkillTagBlacklisted {
        /// Vote record id
        record_id: i64,
        /// Skill name (for display and logs)
        skill_name: String,
        /// Usage key of the tagged xblock
        usage_key: String,
        /// When the decision was made
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A full finalization pass over the pending records completed
    VerificationPassCompleted {
        /// Pending records examined
        examined: usize,
        /// Records transitioned to verified
        verified: usize,
        /// Records transitioned to blacklisted
        blacklisted: usize,
        /// Records left pending
        pending: usize,
        /// Records whose persistence failed (retried on the next pass)
        failed: usize,
        /// When the pass completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Skill tags for a product were refreshed from the extraction API
    SkillsRefreshed {
        /// Product kind that was tagged
        product_type: ProductType,
        /// Course key, program UUID or xblock usage key
        product_key: String,
        /// Number of skills now linked to the product
        skill_count: usize,
        /// When the refresh completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verification schedule was created or updated
    ScheduleApplied {
        /// Schedule name
        name: String,
        /// Interval between passes, in minutes
        interval_minutes: i64,
        /// Whether the schedule is active
        enabled: bool,
        /// When the schedule was applied
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus for application-wide events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TaxonomyEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TaxonomyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening. Emitting with no subscribers is
    /// not an application error; callers typically `.ok()` the result.
    pub fn emit(
        &self,
        event: TaxonomyEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<TaxonomyEvent>> {
        self.tx.send(event)
    }

    /// Number of currently connected subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// Caller asked for it.
    Manual,
    /// Last item expired and the grace delay elapsed.
    Completed,
    /// A tick found the session in a state it could not continue from.
    Inconsistent,
}

/// Every session state change produces an Event.
/// Consumers render from snapshots and react to these for side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionPopulated {
        item_count: usize,
        total_ms: u64,
        at: DateTime<Utc>,
    },
    SessionStarted {
        session_id: Uuid,
        order: i64,
        title: String,
        duration_ms: u64,
        total_remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// The active item expired and the next one by order took over.
    ItemAdvanced {
        session_id: Uuid,
        from_order: i64,
        to_order: i64,
        title: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// The last item expired. The clock is halted; a stop follows after the grace delay.
    SessionDraining {
        session_id: Uuid,
        last_order: i64,
        at: DateTime<Utc>,
    },
    SessionStopped {
        session_id: Option<Uuid>,
        reason: StopReason,
        at: DateTime<Utc>,
    },
}

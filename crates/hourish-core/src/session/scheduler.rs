//! Sequential countdown scheduler.
//!
//! Walks an ordered list of timed items, counting down exactly one at a time.
//! Like the rest of the core it has no internal threads: something else
//! (usually [`SessionRunner`](super::SessionRunner)) calls `tick()` on a short
//! interval. Remaining time is always recomputed from the instant the active
//! item started, so the tick rate only affects smoothness.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Draining -> Idle
//!            \__________________/
//!                  stop()
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = CountdownScheduler::new(SystemClock);
//! scheduler.populate(&records)?;
//! scheduler.start()?;
//! // In a loop:
//! scheduler.tick(); // Returns Some(Event) on hand-over or drain
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::item::{SessionItem, TaskRecord};
use crate::error::SchedulerError;
use crate::events::{SessionEvent, StopReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session running. Items may or may not be populated.
    Idle,
    /// Exactly one item is counting down.
    Running,
    /// Last item expired. Clock halted, waiting out the grace delay.
    Draining,
}

/// Read-only view of the session handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub phase: SessionPhase,
    /// True while Running or Draining.
    pub active: bool,
    pub items: Vec<SessionItem>,
    pub active_order: Option<i64>,
    pub total_remaining_ms: u64,
}

impl SessionSnapshot {
    pub fn active_item(&self) -> Option<&SessionItem> {
        self.items.iter().find(|item| item.is_active)
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_complete()).count()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            phase: SessionPhase::Idle,
            active: false,
            items: Vec::new(),
            active_order: None,
            total_remaining_ms: 0,
        }
    }
}

/// Core countdown state machine.
///
/// Not thread-safe on its own. All commands and ticks must be serialized
/// by the owner.
pub struct CountdownScheduler {
    clock: Arc<dyn Clock>,
    /// Sorted ascending by `order`; order values are unique.
    items: Vec<SessionItem>,
    phase: SessionPhase,
    session_id: Option<Uuid>,
    /// Clock reading when the active item began counting down.
    active_started_ms: Option<u64>,
    /// Active item's remaining time at the moment it became active.
    active_initial_ms: u64,
    total_remaining_ms: u64,
}

impl fmt::Debug for CountdownScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownScheduler")
            .field("items", &self.items)
            .field("phase", &self.phase)
            .field("session_id", &self.session_id)
            .field("active_started_ms", &self.active_started_ms)
            .field("active_initial_ms", &self.active_initial_ms)
            .field("total_remaining_ms", &self.total_remaining_ms)
            .finish_non_exhaustive()
    }
}

impl Default for CountdownScheduler {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl CountdownScheduler {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_shared_clock(Arc::new(clock))
    }

    pub fn with_shared_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            items: Vec::new(),
            phase: SessionPhase::Idle,
            session_id: None,
            active_started_ms: None,
            active_initial_ms: 0,
            total_remaining_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether a session is underway (Running or Draining).
    pub fn is_active(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    pub fn items(&self) -> &[SessionItem] {
        &self.items
    }

    pub fn active_item(&self) -> Option<&SessionItem> {
        self.items.iter().find(|item| item.is_active)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn total_remaining_ms(&self) -> u64 {
        self.total_remaining_ms
    }

    pub fn active_initial_ms(&self) -> u64 {
        self.active_initial_ms
    }

    pub fn active_started_ms(&self) -> Option<u64> {
        self.active_started_ms
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            phase: self.phase,
            active: self.is_active(),
            items: self.items.clone(),
            active_order: self.active_item().map(|item| item.order),
            total_remaining_ms: self.total_remaining_ms,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the item set. Does not start the clock.
    ///
    /// Rejected while a session is active, on duplicate order values and on
    /// unusable durations. A rejected call changes nothing.
    pub fn populate(&mut self, records: &[TaskRecord]) -> Result<SessionEvent, SchedulerError> {
        if self.is_active() {
            return Err(SchedulerError::InvalidState(
                "cannot replace tasks while a session is active".into(),
            ));
        }

        let mut items = records
            .iter()
            .map(SessionItem::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(|item| item.order);

        if let Some(pair) = items.windows(2).find(|pair| pair[0].order == pair[1].order) {
            return Err(SchedulerError::DuplicateOrder {
                order: pair[0].order,
                first: pair[0].title.clone(),
                second: pair[1].title.clone(),
            });
        }

        let total_ms = sum_remaining(&items);
        debug!(item_count = items.len(), total_ms, "session populated");
        self.items = items;
        Ok(SessionEvent::SessionPopulated {
            item_count: self.items.len(),
            total_ms,
            at: Utc::now(),
        })
    }

    /// Activate the lowest-ordered item and begin counting down.
    pub fn start(&mut self) -> Result<SessionEvent, SchedulerError> {
        if self.is_active() {
            return Err(SchedulerError::AlreadyActive);
        }
        let index = self
            .items
            .iter()
            .enumerate()
            .min_by_key(|(_, item)| item.order)
            .map(|(index, _)| index)
            .ok_or(SchedulerError::EmptySchedule)?;

        let session_id = Uuid::new_v4();
        let now = self.clock.now_ms();
        self.session_id = Some(session_id);
        self.phase = SessionPhase::Running;
        self.activate(index, now);
        self.recompute_total();

        let item = &self.items[index];
        debug!(%session_id, order = item.order, title = %item.title, "session started");
        Ok(SessionEvent::SessionStarted {
            session_id,
            order: item.order,
            title: item.title.clone(),
            duration_ms: item.remaining_ms,
            total_remaining_ms: self.total_remaining_ms,
            at: Utc::now(),
        })
    }

    /// Tear the session down. Safe from any phase, any number of times.
    ///
    /// Returns `None` when there was no session to stop.
    pub fn stop(&mut self) -> Option<SessionEvent> {
        self.stop_with(StopReason::Manual)
    }

    /// Deferred stop after the grace delay.
    ///
    /// Only acts if `session_id` is still the session being drained, so a
    /// late call never touches a stopped or newer session.
    pub fn finish_drain(&mut self, session_id: Uuid) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Draining || self.session_id != Some(session_id) {
            return None;
        }
        self.stop_with(StopReason::Completed)
    }

    /// Call periodically. Returns an event when the active item expires.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Running {
            return None;
        }

        let (index, started_ms, session_id) =
            match (self.active_index(), self.active_started_ms, self.session_id) {
                (Some(index), Some(started_ms), Some(session_id)) => (index, started_ms, session_id),
                _ => {
                    let err = SchedulerError::InconsistentState(
                        "running without an active item or start instant".into(),
                    );
                    warn!(error = %err, "forcing session stop");
                    return self.stop_with(StopReason::Inconsistent);
                }
            };

        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(started_ms);
        let computed = self.active_initial_ms.saturating_sub(elapsed);
        // Never let a clock stepping backwards push the countdown up again.
        let remaining = computed.min(self.items[index].remaining_ms);
        self.items[index].remaining_ms = remaining;
        self.recompute_total();

        if remaining > 0 {
            trace!(order = self.items[index].order, remaining, "tick");
            return None;
        }

        let finished = &mut self.items[index];
        finished.remaining_ms = 0;
        finished.is_active = false;
        let from_order = finished.order;

        match self.next_index_after(from_order) {
            Some(next) => {
                self.activate(next, now);
                let item = &self.items[next];
                debug!(%session_id, from_order, to_order = item.order, "item advanced");
                Some(SessionEvent::ItemAdvanced {
                    session_id,
                    from_order,
                    to_order: item.order,
                    title: item.title.clone(),
                    duration_ms: item.remaining_ms,
                    at: Utc::now(),
                })
            }
            None => {
                self.phase = SessionPhase::Draining;
                self.active_started_ms = None;
                self.active_initial_ms = 0;
                debug!(%session_id, last_order = from_order, "session draining");
                Some(SessionEvent::SessionDraining {
                    session_id,
                    last_order: from_order,
                    at: Utc::now(),
                })
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn stop_with(&mut self, reason: StopReason) -> Option<SessionEvent> {
        let was_active = self.is_active();
        self.phase = SessionPhase::Idle;
        for item in &mut self.items {
            item.is_active = false;
        }
        self.active_started_ms = None;
        self.active_initial_ms = 0;
        self.total_remaining_ms = 0;
        let session_id = self.session_id.take();

        if !was_active {
            return None;
        }
        debug!(?session_id, ?reason, "session stopped");
        Some(SessionEvent::SessionStopped {
            session_id,
            reason,
            at: Utc::now(),
        })
    }

    fn activate(&mut self, index: usize, now_ms: u64) {
        let item = &mut self.items[index];
        item.is_active = true;
        self.active_initial_ms = item.remaining_ms;
        self.active_started_ms = Some(now_ms);
    }

    fn active_index(&self) -> Option<usize> {
        self.items.iter().position(|item| item.is_active)
    }

    /// Item with the smallest order strictly greater than `order`.
    fn next_index_after(&self, order: i64) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.order > order)
            .min_by_key(|(_, item)| item.order)
            .map(|(index, _)| index)
    }

    fn recompute_total(&mut self) {
        self.total_remaining_ms = sum_remaining(&self.items);
    }
}

fn sum_remaining(items: &[SessionItem]) -> u64 {
    items
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(item.remaining_ms))
}

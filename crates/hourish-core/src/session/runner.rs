//! Background clock driver for [`CountdownScheduler`].
//!
//! The runner owns the scheduler behind a mutex and spawns one Tokio task per
//! session that calls `tick()` on a fixed interval. The task holds a
//! cancellation token rather than relying on the runner's lifetime: `stop()`
//! and `Drop` cancel it first, and the task re-checks the token under the
//! lock before every mutation, so nothing ticks after a stop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use super::clock::{Clock, MonotonicClock};
use super::item::TaskRecord;
use super::scheduler::{CountdownScheduler, SessionPhase, SessionSnapshot};
use crate::config::SessionConfig;
use crate::error::{CoreError, Result, SchedulerError};
use crate::events::SessionEvent;

const EVENT_CAPACITY: usize = 64;

struct Shared {
    scheduler: Mutex<CountdownScheduler>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CountdownScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push state to observers. Called with the scheduler lock held so
    /// observers see updates in the order they happened.
    fn publish(&self, scheduler: &CountdownScheduler, event: Option<SessionEvent>) {
        self.snapshots.send_replace(scheduler.snapshot());
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}

struct ClockTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs a countdown session in the background.
///
/// All commands are synchronous and return immediately.
pub struct SessionRunner {
    shared: Arc<Shared>,
    runtime: Handle,
    tick_interval: Duration,
    grace_delay: Duration,
    clock_task: Mutex<Option<ClockTask>>,
}

impl SessionRunner {
    /// Create a runner on the current Tokio runtime using a monotonic clock.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CoreError::RuntimeUnavailable)?;
        // Read inside the runtime so a paused test clock is honoured.
        let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
        Ok(Self::with_clock(runtime, config, clock))
    }

    pub fn with_clock(runtime: Handle, config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let scheduler = CountdownScheduler::with_shared_clock(clock);
        let (snapshots, _) = watch::channel(scheduler.snapshot());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                scheduler: Mutex::new(scheduler),
                snapshots,
                events,
            }),
            runtime,
            tick_interval: config.tick_interval(),
            grace_delay: config.grace_delay(),
            clock_task: Mutex::new(None),
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.lock().phase()
    }

    /// Receives a fresh snapshot after every command and every tick.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Receives lifecycle events from the moment of subscription.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Resolves once no session is active.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // Sender lives in `self.shared`, so this cannot close while we borrow self.
        let _ = rx.wait_for(|snapshot| !snapshot.active).await;
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn populate(&self, records: &[TaskRecord]) -> Result<(), SchedulerError> {
        let mut scheduler = self.shared.lock();
        let event = scheduler.populate(records)?;
        self.shared.publish(&scheduler, Some(event));
        Ok(())
    }

    pub fn start(&self) -> Result<(), SchedulerError> {
        // Held until the new task is stored so concurrent start/stop calls
        // cannot swap clock tasks between sessions. Lock order: clock_task, then scheduler.
        let mut clock_task = lock(&self.clock_task);
        let session_id = {
            let mut scheduler = self.shared.lock();
            let event = scheduler.start()?;
            self.shared.publish(&scheduler, Some(event));
            scheduler.session_id()
        };
        let Some(session_id) = session_id else {
            return Err(SchedulerError::InconsistentState(
                "session started without an id".into(),
            ));
        };

        if let Some(previous) = clock_task.take() {
            previous.token.cancel();
        }
        let token = CancellationToken::new();
        let handle = self.runtime.spawn(drive(
            Arc::clone(&self.shared),
            token.clone(),
            session_id,
            self.tick_interval,
            self.grace_delay,
        ));
        *clock_task = Some(ClockTask { token, handle });
        Ok(())
    }

    /// Halt the clock and reset the session. Always succeeds.
    pub fn stop(&self) {
        let mut clock_task = lock(&self.clock_task);
        if let Some(task) = clock_task.take() {
            task.token.cancel();
            drop(task.handle);
        }
        let mut scheduler = self.shared.lock();
        let event = scheduler.stop();
        self.shared.publish(&scheduler, event);
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.clock_task).take() {
            task.token.cancel();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn drive(
    shared: Arc<Shared>,
    token: CancellationToken,
    session_id: Uuid,
    tick_interval: Duration,
    grace_delay: Duration,
) {
    let mut interval = tokio::time::interval(tick_interval.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(%session_id, ?tick_interval, "clock started");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                trace!(%session_id, "clock cancelled");
                return;
            }
            _ = interval.tick() => {}
        }

        let phase = {
            let mut scheduler = shared.lock();
            if token.is_cancelled() {
                return;
            }
            let event = scheduler.tick();
            shared.publish(&scheduler, event);
            scheduler.phase()
        };

        match phase {
            SessionPhase::Running => {}
            SessionPhase::Draining => break,
            SessionPhase::Idle => return,
        }
    }

    // Last item done: no more ticks, just the grace pause before teardown.
    drop(interval);
    debug!(%session_id, ?grace_delay, "clock halted, draining");
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(grace_delay) => {}
    }

    let mut scheduler = shared.lock();
    if token.is_cancelled() {
        return;
    }
    let event = scheduler.finish_drain(session_id);
    shared.publish(&scheduler, event);
}

//! Repeating-timer capability used by the engine to step automatically.
//!
//! The engine never touches a timer primitive directly: it registers a
//! callback through [`Scheduler`] and keeps only the returned
//! [`TimerHandle`]. [`ManualScheduler`] runs on a logical clock for
//! deterministic tests and batch runs; [`TokioScheduler`] fires on the wall
//! clock of a tokio runtime.

use life_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Opaque identifier of a registered repeating callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Schedules and cancels repeating callbacks.
///
/// Implementations must not run the callback from inside
/// `schedule_repeating`, and must not hold a lock that `cancel` needs while
/// a callback runs. Cancelling an unknown handle is a no-op.
pub trait Scheduler: Send + Sync {
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> TimerHandle {
        (**self).schedule_repeating(interval, callback)
    }

    fn cancel(&self, handle: TimerHandle) {
        (**self).cancel(handle)
    }
}

struct ManualTimer {
    interval_ms: u64,
    next_due_ms: u64,
    callback: TickCallback,
}

#[derive(Default)]
struct ManualState {
    now_ms: u64,
    next_id: u64,
    registrations: usize,
    timers: BTreeMap<TimerHandle, ManualTimer>,
}

/// Scheduler driven by an explicit logical clock.
///
/// Nothing fires until [`ManualScheduler::advance`] is called. Intervals are
/// tracked in whole milliseconds with a 1ms minimum.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical time elapsed since creation
    pub fn now(&self) -> Duration {
        Duration::from_millis(self.state.lock().now_ms)
    }

    /// Total number of `schedule_repeating` calls so far
    pub fn registrations(&self) -> usize {
        self.state.lock().registrations
    }

    pub fn active_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    pub fn active_handles(&self) -> Vec<TimerHandle> {
        self.state.lock().timers.keys().copied().collect()
    }

    pub fn interval_of(&self, handle: TimerHandle) -> Option<Duration> {
        self.state
            .lock()
            .timers
            .get(&handle)
            .map(|timer| Duration::from_millis(timer.interval_ms))
    }

    /// The callback registered under `handle`, e.g. to replay a tick that
    /// raced with its cancellation
    pub fn callback(&self, handle: TimerHandle) -> Option<TickCallback> {
        self.state
            .lock()
            .timers
            .get(&handle)
            .map(|timer| timer.callback.clone())
    }

    /// Move the clock forward, firing every due callback in deadline order.
    /// Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target_ms = {
            let state = self.state.lock();
            state.now_ms.saturating_add(duration_to_ms(by))
        };

        let mut fired = 0;
        loop {
            let due = {
                let mut state = self.state.lock();
                let next = state
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.next_due_ms <= target_ms)
                    .min_by_key(|(handle, timer)| (timer.next_due_ms, **handle))
                    .map(|(handle, _)| *handle);

                match next {
                    Some(handle) => {
                        let mut callback = None;
                        let mut due_ms = target_ms;
                        if let Some(timer) = state.timers.get_mut(&handle) {
                            due_ms = timer.next_due_ms;
                            timer.next_due_ms = timer.next_due_ms.saturating_add(timer.interval_ms);
                            callback = Some(timer.callback.clone());
                        }
                        state.now_ms = due_ms;
                        callback
                    }
                    None => {
                        state.now_ms = target_ms;
                        None
                    }
                }
            };

            // The lock is released before the callback runs.
            match due {
                Some(callback) => {
                    callback();
                    fired += 1;
                }
                None => break,
            }
        }

        trace!(fired, now_ms = target_ms, "Manual clock advanced");
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> TimerHandle {
        let mut state = self.state.lock();
        let handle = TimerHandle(state.next_id);
        state.next_id += 1;
        state.registrations += 1;

        let interval_ms = duration_to_ms(interval).max(1);
        let next_due_ms = state.now_ms.saturating_add(interval_ms);
        state.timers.insert(
            handle,
            ManualTimer {
                interval_ms,
                next_due_ms,
                callback,
            },
        );
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.state.lock().timers.remove(&handle);
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Scheduler backed by tokio timers.
///
/// Each registration spawns a task on the runtime that ticks every
/// `interval` (first tick one full interval after registration) until its
/// cancellation token fires.
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    timers: Mutex<HashMap<TimerHandle, CancellationToken>>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(0),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Use the runtime of the calling context
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| Error::Scheduler(e.to_string()))
    }

    pub fn active_timers(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        self.timers.lock().insert(handle, token.clone());

        let period = interval.max(Duration::from_millis(1));
        self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => callback(),
                }
            }
            trace!(%handle, "Timer task finished");
        });

        debug!(%handle, interval_ms = duration_to_ms(period), "Scheduled repeating timer");
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(token) = self.timers.lock().remove(&handle) {
            token.cancel();
            debug!(%handle, "Cancelled repeating timer");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, token) in self.timers.lock().drain() {
            token.cancel();
        }
    }
}

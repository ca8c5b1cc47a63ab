//! A [`Timer`] whose time only moves when the host says so.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use parking_lot::Mutex;

use crate::timing::{Callback, PendingTimer, Timer};

// Ordered by deadline, ties broken by scheduling order.
type Key = (Duration, u64);

struct ClockState {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<Key, Callback>,
}

/// Virtual-time timer advanced explicitly by the host.
///
/// Hosts with their own frame or event loop can drive debouncers from it, and
/// tests get fully deterministic timing. Callbacks run on the thread that calls
/// [`advance`](ManualClock::advance) or [`tick`](ManualClock::tick).
///
/// Clones share the same clock.
#[derive(Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    /// Creates a clock at time zero with nothing scheduled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                now: Duration::ZERO,
                next_seq: 0,
                queue: BTreeMap::new(),
            })),
        }
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Number of callbacks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Runs callbacks that are already due, including zero-delay ones,
    /// without moving time forward.
    pub fn tick(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Moves time forward by `by`, firing every callback that falls due on the
    /// way in deadline order. Returns the number of callbacks fired.
    ///
    /// Callbacks scheduled by other callbacks during the advance fire too if
    /// their deadline is within range.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.lock().now.saturating_add(by);
        let mut fired = 0;

        loop {
            // The lock is released before firing; callbacks may schedule or cancel.
            let due = {
                let mut state = self.inner.lock();
                let key = state
                    .queue
                    .keys()
                    .next()
                    .copied()
                    .filter(|(deadline, _)| *deadline <= target);
                key.and_then(|key| {
                    state.now = state.now.max(key.0);
                    state.queue.remove(&key)
                })
            };
            let Some(fire) = due else {
                break;
            };
            fire();
            fired += 1;
        }

        let mut state = self.inner.lock();
        state.now = state.now.max(target);
        fired
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ManualClock")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl Timer for ManualClock {
    fn schedule(&self, delay: Duration, fire: Callback) -> PendingTimer {
        let key = {
            let mut state = self.inner.lock();
            let key = (state.now.saturating_add(delay), state.next_seq);
            state.next_seq += 1;
            state.queue.insert(key, fire);
            key
        };
        let clock: Weak<Mutex<ClockState>> = Arc::downgrade(&self.inner);
        PendingTimer::new(move || {
            if let Some(clock) = clock.upgrade() {
                clock.lock().queue.remove(&key);
            }
        })
    }
}

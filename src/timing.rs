//! Timer facilities that drive debounce bursts.
//!
//! A [`Debouncer`](crate::Debouncer) never sleeps on its own. It asks a [`Timer`]
//! to run a callback after a delay and keeps the returned [`PendingTimer`] guard
//! for as long as that callback is still wanted. Dropping the guard cancels the
//! timer, so every exit path (reschedule, cancel, flush, teardown) releases it.
//!
//! Provided facilities:
//! - [`ThreadPoolTimer`], the default, works with any executor or none at all
//! - `TokioTimer` (feature `tokio`), spawns onto a tokio runtime
//! - [`ManualClock`](crate::ManualClock), virtual time advanced by the host
//! - [`Headless`], for execution contexts without any timer facility

use std::{
    fmt,
    sync::OnceLock,
    time::{Duration, Instant},
};

use async_io::Timer as Deadline;
use futures::{
    channel::oneshot,
    executor::{ThreadPool, ThreadPoolBuilder},
    future::{self, Either},
};
use tracing::{trace, warn};

use crate::error::{DebounceError, Result};

static THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

const DEFAULT_POOL_SIZE: usize = 4;

/// Callback run by a [`Timer`] once its delay has elapsed.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// A facility that runs a callback after a delay.
///
/// Implementations must never run the callback synchronously from inside
/// [`schedule`](Timer::schedule), not even for a zero delay. The callback runs
/// at the earliest on the next tick of the facility.
pub trait Timer: Send + Sync {
    /// Requests `fire` to be called once `delay` has elapsed.
    ///
    /// The returned guard cancels the request when dropped.
    fn schedule(&self, delay: Duration, fire: Callback) -> PendingTimer;

    /// Reports whether this facility can schedule anything at all.
    ///
    /// A debouncer checks this once when it is created and skips scheduling
    /// entirely when it returns `false`.
    fn is_available(&self) -> bool {
        true
    }
}

/// Guard for a scheduled timer callback.
///
/// Dropping the guard cancels the callback if it has not run yet and releases
/// whatever the facility holds for it.
#[must_use = "dropping a PendingTimer cancels it"]
pub struct PendingTimer {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl PendingTimer {
    /// Creates a guard that runs `cancel` when dropped.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A guard with nothing to cancel.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Cancels the timer. Same as dropping the guard.
    pub fn cancel(self) {
        drop(self);
    }

    /// Releases the guard without cancelling the timer.
    ///
    /// Used by the callback itself once it is running.
    pub fn disarm(mut self) {
        self.cancel.take();
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for PendingTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTimer")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Executor agnostic timer backed by a `futures` thread pool.
///
/// The deadline is fixed when the timer is scheduled. Waiting timers are parked
/// futures driven by the `async-io` reactor, so pool threads are only busy while
/// a callback actually runs and any number of timers can wait at once.
#[derive(Clone, Debug)]
pub struct ThreadPoolTimer {
    pool: ThreadPool,
}

impl ThreadPoolTimer {
    /// Creates a timer with its own pool of `pool_size` threads.
    ///
    /// # Errors
    ///
    /// Returns [`DebounceError::ThreadPool`] if the pool threads cannot be spawned.
    pub fn new(pool_size: usize) -> Result<Self> {
        let pool = Self::build_pool(pool_size)?;
        Ok(Self { pool })
    }

    /// Returns a timer backed by the process-wide shared pool.
    ///
    /// The pool is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DebounceError::TimerUnavailable`] if the shared pool could not be
    /// created. The underlying cause is logged once.
    pub fn shared() -> Result<Self> {
        THREAD_POOL
            .get_or_init(|| match Self::build_pool(DEFAULT_POOL_SIZE) {
                Ok(pool) => Some(pool),
                Err(error) => {
                    warn!(%error, "shared timer pool unavailable");
                    None
                }
            })
            .clone()
            .map(|pool| Self { pool })
            .ok_or(DebounceError::TimerUnavailable)
    }

    fn build_pool(pool_size: usize) -> Result<ThreadPool> {
        let pool = ThreadPoolBuilder::new()
            .pool_size(pool_size.max(1))
            .name_prefix("settle-timer-")
            .create()?;
        Ok(pool)
    }
}

impl Timer for ThreadPoolTimer {
    fn schedule(&self, delay: Duration, fire: Callback) -> PendingTimer {
        let deadline = Instant::now()
            .checked_add(delay)
            .map_or_else(Deadline::never, Deadline::at);
        // Dropping the sender resolves `canceled` and ends the wait early.
        let (cancel_tx, canceled) = oneshot::channel::<()>();
        self.pool.spawn_ok(async move {
            match future::select(deadline, canceled).await {
                Either::Left(_) => fire(),
                Either::Right(_) => trace!("pool timer canceled before firing"),
            }
        });
        PendingTimer::new(move || drop(cancel_tx))
    }
}

/// Timer for execution contexts that cannot schedule anything.
///
/// A debouncer created with `Headless` mirrors its input directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct Headless;

impl Timer for Headless {
    fn schedule(&self, _delay: Duration, _fire: Callback) -> PendingTimer {
        PendingTimer::inert()
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(feature = "tokio")]
pub use self::tokio_timer::TokioTimer;

#[cfg(feature = "tokio")]
mod tokio_timer {
    use std::time::Duration;

    use tokio::runtime::Handle;

    use super::{Callback, PendingTimer, Timer};
    use crate::error::{DebounceError, Result};

    /// Timer that spawns its callbacks onto a tokio runtime.
    ///
    /// Cancellation aborts the spawned task.
    #[derive(Clone, Debug)]
    pub struct TokioTimer {
        handle: Handle,
    }

    impl TokioTimer {
        /// Uses the runtime the caller is currently running in.
        ///
        /// # Errors
        ///
        /// Returns [`DebounceError::TimerUnavailable`] when called outside a
        /// tokio runtime.
        pub fn current() -> Result<Self> {
            Handle::try_current()
                .map(Self::from_handle)
                .map_err(|_| DebounceError::TimerUnavailable)
        }

        /// Uses the runtime behind `handle`.
        pub fn from_handle(handle: Handle) -> Self {
            Self { handle }
        }
    }

    impl Timer for TokioTimer {
        fn schedule(&self, delay: Duration, fire: Callback) -> PendingTimer {
            let task = self.handle.spawn(async move {
                tokio::time::sleep(delay).await;
                fire();
            });
            PendingTimer::new(move || task.abort())
        }
    }
}

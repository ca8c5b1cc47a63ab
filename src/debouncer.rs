//! Defines the `Debouncer` and its companion handles.
//!
//! A `Debouncer` exposes a settled value that follows a rapidly changing input.
//! The host reports every change of the input value, the delay or the edge
//! options, and the debouncer reacts by (re)arming a single timer. The settled
//! value moves at the start of a burst (leading edge), once the input has been
//! quiet for the delay (trailing edge), or on an explicit flush.
//!
//! All state transitions happen under one lock, so an input change and a timer
//! firing never interleave. A firing that lost the race against a reschedule is
//! recognized by its generation and ignored.
//!
//! This module also provides `DebounceControls`, a detached handle for cancel and
//! flush, and `SettledChanges`, a stream of settled value emissions.

use std::{
    fmt,
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll},
    time::Duration,
};

use futures::{
    FutureExt, Stream, StreamExt,
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    DebounceConfig, DebounceOptions,
    timing::{Headless, PendingTimer, ThreadPoolTimer, Timer},
};

// A live timer tagged with the generation it was armed for.
struct Armed {
    generation: u64,
    timer: PendingTimer,
}

struct Shared<T> {
    // Latest value reported by the host.
    input: T,
    // Value exposed to consumers. Always some earlier `input`.
    settled: T,
    config: DebounceConfig,
    // Set once the current burst had its leading emission.
    leading_fired: bool,
    pending: Option<Armed>,
    generation: u64,
    subscribers: Vec<UnboundedSender<T>>,
    torn_down: bool,
}

impl<T: Clone + PartialEq> Shared<T> {
    fn new(initial: T, config: DebounceConfig) -> Self {
        Self {
            input: initial.clone(),
            settled: initial,
            config,
            leading_fired: false,
            pending: None,
            generation: 0,
            subscribers: Vec::new(),
            torn_down: false,
        }
    }

    fn is_idle(&self) -> bool {
        self.pending.is_none() && !self.leading_fired
    }

    fn settle(&mut self, value: T) {
        if self.torn_down || self.settled == value {
            return;
        }
        self.settled = value;
        let settled = &self.settled;
        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(settled.clone()).is_ok());
        debug!(subscribers = self.subscribers.len(), "settled value changed");
    }

    fn cancel(&mut self) -> bool {
        let Some(armed) = self.pending.take() else {
            return false;
        };
        trace!(generation = armed.generation, "canceled debounce timer");
        armed.timer.cancel();
        self.leading_fired = false;
        true
    }

    fn flush(&mut self) {
        self.cancel();
        let value = self.input.clone();
        self.settle(value);
        debug!("flushed debouncer");
    }

    fn fire(&mut self, generation: u64, value: T) {
        match self.pending.take() {
            Some(armed) if armed.generation == generation => armed.timer.disarm(),
            other => {
                self.pending = other;
                trace!(generation, "ignored stale debounce timer");
                return;
            }
        }
        if self.config.options.trailing {
            self.settle(value);
        }
        self.leading_fired = false;
    }
}

/// A settled value that follows a rapidly changing input.
///
/// The host reports changes through [`set_value`], [`set_delay`],
/// [`set_options`] or [`update`]. Each report that actually changes something
/// starts or extends a burst:
///
/// - with `leading` enabled, the first change of a burst is settled immediately
/// - every change cancels the pending timer and arms a new one for the delay
/// - when a timer fires with `trailing` enabled, the value captured when it was
///   armed becomes settled, and the burst ends
///
/// Dropping the debouncer is its teardown: the pending timer is cancelled, every
/// [`changes`] stream ends, and nothing is emitted afterwards.
///
/// If the timer facility is unavailable the debouncer never schedules anything
/// and the settled value simply mirrors the input.
///
/// [`set_value`]: Debouncer::set_value
/// [`set_delay`]: Debouncer::set_delay
/// [`set_options`]: Debouncer::set_options
/// [`update`]: Debouncer::update
/// [`changes`]: Debouncer::changes
///
/// # Example
/// ```
/// # use settle::{Debouncer, ManualClock};
/// # use std::time::Duration;
/// let clock = ManualClock::new();
/// let query = Debouncer::with_timer(String::new(), Duration::from_millis(300), clock.clone());
///
/// query.set_value("r".to_string());
/// query.set_value("ru".to_string());
/// query.set_value("rust".to_string());
/// assert_eq!(query.debounced_value(), "");
///
/// clock.advance(Duration::from_millis(300));
/// assert_eq!(query.debounced_value(), "rust");
/// ```
pub struct Debouncer<T> {
    shared: Arc<Mutex<Shared<T>>>,
    timer: Option<Arc<dyn Timer>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Creates a trailing-edge debouncer on the shared thread pool timer.
    ///
    /// `initial` is settled right away, without debouncing.
    #[must_use]
    pub fn new(initial: T, delay: Duration) -> Self {
        Self::with_config(initial, DebounceConfig::new(delay))
    }

    /// Creates a debouncer with explicit edge options on the shared thread pool
    /// timer.
    #[must_use]
    pub fn with_options(initial: T, delay: Duration, options: DebounceOptions) -> Self {
        Self::with_config(initial, DebounceConfig::new(delay).with_options(options))
    }

    /// Creates a debouncer from a full configuration on the shared thread pool
    /// timer.
    ///
    /// Falls back to headless mode if the pool cannot be created.
    #[must_use]
    pub fn with_config(initial: T, config: DebounceConfig) -> Self {
        match ThreadPoolTimer::shared() {
            Ok(timer) => Self::with_timer(initial, config, timer),
            Err(error) => {
                debug!(%error, "falling back to headless debouncer");
                Self::with_timer(initial, config, Headless)
            }
        }
    }

    /// Creates a debouncer driven by the given timer facility.
    ///
    /// The facility is checked once here. If it reports itself unavailable the
    /// debouncer runs headless.
    #[must_use]
    pub fn with_timer(
        initial: T,
        config: impl Into<DebounceConfig>,
        timer: impl Timer + 'static,
    ) -> Self {
        let timer: Option<Arc<dyn Timer>> = if timer.is_available() {
            Some(Arc::new(timer))
        } else {
            debug!("timer facility unavailable, scheduling disabled");
            None
        };
        Self {
            shared: Arc::new(Mutex::new(Shared::new(initial, config.into()))),
            timer,
        }
    }

    /// Reports a new input value.
    ///
    /// A value equal to the current input is not a change and is ignored.
    pub fn set_value(&self, value: T) {
        let mut shared = self.shared.lock();
        if shared.input == value {
            return;
        }
        shared.input = value;
        self.react(&mut shared);
    }

    /// Reports a new delay.
    ///
    /// A pending timer is re-armed with the new delay.
    pub fn set_delay(&self, delay: Duration) {
        let mut shared = self.shared.lock();
        if shared.config.delay == delay {
            return;
        }
        shared.config.delay = delay;
        self.react(&mut shared);
    }

    /// Reports new edge options.
    ///
    /// A leading emission already made in the current burst stays in place.
    pub fn set_options(&self, options: DebounceOptions) {
        let mut shared = self.shared.lock();
        if shared.config.options == options {
            return;
        }
        shared.config.options = options;
        self.react(&mut shared);
    }

    /// Reports all four dependencies at once.
    ///
    /// Reacts a single time if any of them changed, and not at all otherwise.
    pub fn update(&self, value: T, delay: Duration, options: DebounceOptions) {
        let mut shared = self.shared.lock();
        let config = DebounceConfig::new(delay).with_options(options);
        if shared.input == value && shared.config == config {
            return;
        }
        shared.input = value;
        shared.config = config;
        self.react(&mut shared);
    }

    /// Returns the current settled value.
    #[must_use]
    pub fn debounced_value(&self) -> T {
        self.shared.lock().settled.clone()
    }

    /// Returns the latest reported input value.
    #[must_use]
    pub fn input(&self) -> T {
        self.shared.lock().input.clone()
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> DebounceConfig {
        self.shared.lock().config
    }

    /// Returns `true` while a timer is armed, i.e. a burst is in progress.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.lock().pending.is_some()
    }

    /// Cancels the pending timer and ends the burst without emitting.
    ///
    /// Calling this with nothing pending does nothing.
    pub fn cancel(&self) {
        self.shared.lock().cancel();
    }

    /// Cancels the pending timer and settles the latest input immediately.
    pub fn flush(&self) {
        self.shared.lock().flush();
    }

    /// Returns a stream of every future settled value change.
    ///
    /// The stream ends when the debouncer is dropped.
    pub fn changes(&self) -> SettledChanges<T> {
        let (sender, receiver) = mpsc::unbounded();
        let mut shared = self.shared.lock();
        if !shared.torn_down {
            shared.subscribers.push(sender);
        }
        SettledChanges { receiver }
    }

    /// Returns a detached handle for cancelling and flushing this debouncer.
    #[must_use]
    pub fn controls(&self) -> DebounceControls<T> {
        DebounceControls {
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn react(&self, shared: &mut Shared<T>) {
        let Some(timer) = &self.timer else {
            let value = shared.input.clone();
            shared.settle(value);
            return;
        };

        if shared.config.options.leading && shared.is_idle() {
            let value = shared.input.clone();
            shared.settle(value);
            shared.leading_fired = true;
        }

        // Rescheduling keeps the burst going, so the leading flag stays.
        if let Some(armed) = shared.pending.take() {
            armed.timer.cancel();
        }

        shared.generation = shared.generation.wrapping_add(1);
        let generation = shared.generation;
        let delay = shared.config.delay;
        let value = shared.input.clone();
        let weak = Arc::downgrade(&self.shared);
        let pending = timer.schedule(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.lock().fire(generation, value);
                }
            }),
        );
        trace!(generation, ?delay, "armed debounce timer");
        shared.pending = Some(Armed {
            generation,
            timer: pending,
        });
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        shared.torn_down = true;
        if let Some(armed) = shared.pending.take() {
            armed.timer.cancel();
        }
        shared.leading_fired = false;
        shared.subscribers.clear();
        debug!("debouncer torn down");
    }
}

impl<T: fmt::Debug> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("Debouncer")
            .field("input", &shared.input)
            .field("settled", &shared.settled)
            .field("config", &shared.config)
            .field("pending", &shared.pending.is_some())
            .field("headless", &self.timer.is_none())
            .finish()
    }
}

/// A handle for cancelling or flushing a [`Debouncer`] from elsewhere.
///
/// The handle does not keep the debouncer alive. Once the debouncer is dropped
/// every operation becomes a no-op. Obtained with [`Debouncer::controls`].
pub struct DebounceControls<T> {
    shared: Weak<Mutex<Shared<T>>>,
}

impl<T: Clone + PartialEq> DebounceControls<T> {
    /// Same as [`Debouncer::cancel`].
    pub fn cancel(&self) {
        self.with_live(|shared| {
            shared.cancel();
        });
    }

    /// Same as [`Debouncer::flush`].
    pub fn flush(&self) {
        self.with_live(Shared::flush);
    }

    /// The current settled value, or `None` after teardown.
    #[must_use]
    pub fn debounced_value(&self) -> Option<T> {
        self.with_live(|shared| shared.settled.clone())
    }

    /// Returns `false` once the debouncer has been dropped.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.with_live(|_| ()).is_some()
    }

    fn with_live<R>(&self, f: impl FnOnce(&mut Shared<T>) -> R) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let mut shared = shared.lock();
        if shared.torn_down {
            return None;
        }
        Some(f(&mut shared))
    }
}

impl<T> Clone for DebounceControls<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for DebounceControls<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebounceControls")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// Stream of settled values, one item per change.
///
/// Returned by [`Debouncer::changes`]. Ends when the debouncer is dropped.
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct SettledChanges<T> {
    receiver: UnboundedReceiver<T>,
}

impl<T> SettledChanges<T> {
    /// Returns the next already emitted value without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        self.receiver.next().now_or_never().flatten()
    }
}

impl<T> Stream for SettledChanges<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

//! Settled values for rapidly changing input.
//!
//! `settle` turns a value that changes in quick bursts (a search box being typed
//! into, a slider being dragged) into a secondary value that only updates once
//! the input has been quiet for a configurable delay. Leading-edge emission,
//! trailing-edge emission, cancel and flush are all supported.
//!
//! The crate does not depend on any specific async runtime. Timing is delegated
//! to a [`Timer`] facility:
//! - [`ThreadPoolTimer`], the default, backed by a `futures` thread pool
//! - `TokioTimer` with the `tokio` feature
//! - [`ManualClock`] for hosts with their own frame loop, and for tests
//! - [`Headless`] for contexts that cannot schedule timers at all
//!
//! Features include:
//! - A [`Debouncer`] that owns exactly one pending timer and the settled value
//! - [`DebounceControls`] for cancelling or flushing from detached callbacks
//! - [`SettledChanges`], a stream of every settled value change
//! - [`DebounceExt`] for debouncing any `Stream`
//!
//! # Example
//! ```
//! use settle::{DebounceOptions, Debouncer, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let debouncer = Debouncer::with_timer(
//!     0,
//!     settle::DebounceConfig::new(Duration::from_millis(100))
//!         .with_options(DebounceOptions::new().leading(true)),
//!     clock.clone(),
//! );
//!
//! debouncer.set_value(1);
//! debouncer.set_value(2);
//! assert_eq!(debouncer.debounced_value(), 1);
//!
//! clock.advance(Duration::from_millis(100));
//! assert_eq!(debouncer.debounced_value(), 2);
//! ```

pub mod debouncer;
pub mod error;
pub mod manual;
pub mod options;
pub mod stream_ext;
pub mod timing;

pub use debouncer::{DebounceControls, Debouncer, SettledChanges};
pub use error::{DebounceError, Result};
pub use manual::ManualClock;
pub use options::{DebounceConfig, DebounceOptions};
pub use stream_ext::{DebounceExt, Debounced};
#[cfg(feature = "tokio")]
pub use timing::TokioTimer;
pub use timing::{Headless, PendingTimer, ThreadPoolTimer, Timer};

//! Debounce configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which edges of a burst produce a settled value.
///
/// By default only the trailing edge emits: the settled value follows the input
/// once it has stopped changing for the configured delay. Enabling `leading`
/// additionally emits the first value of every burst immediately.
///
/// Disabling both edges is allowed. In that case the settled value only moves on
/// an explicit [`flush`](crate::Debouncer::flush).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[must_use]
pub struct DebounceOptions {
    /// Emit the first value of a burst immediately.
    pub leading: bool,
    /// Emit the last value of a burst once the delay elapses.
    pub trailing: bool,
}

impl DebounceOptions {
    /// Trailing-edge only options, same as [`Default`].
    pub const fn new() -> Self {
        Self {
            leading: false,
            trailing: true,
        }
    }

    /// Sets whether the first value of a burst is emitted immediately.
    pub const fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Sets whether the last value of a burst is emitted after the delay.
    pub const fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Full debounce configuration: the quiet period plus edge options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[must_use]
pub struct DebounceConfig {
    /// How long the input must stay unchanged before a trailing emission.
    pub delay: Duration,
    /// Edge options.
    #[cfg_attr(feature = "serde", serde(default))]
    pub options: DebounceOptions,
}

impl DebounceConfig {
    /// Creates a trailing-edge configuration with the given delay.
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            options: DebounceOptions::new(),
        }
    }

    /// Replaces the edge options.
    pub const fn with_options(mut self, options: DebounceOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<Duration> for DebounceConfig {
    fn from(delay: Duration) -> Self {
        Self::new(delay)
    }
}

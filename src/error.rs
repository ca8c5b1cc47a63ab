//! Error types for timer construction.
//!
//! Debouncing itself never fails. Errors only surface when a timer facility is
//! requested in an environment that cannot provide one.

use thiserror::Error;

/// Result type alias using [`DebounceError`].
pub type Result<T> = std::result::Result<T, DebounceError>;

/// Errors returned by timer constructors.
#[derive(Error, Debug)]
pub enum DebounceError {
    /// The timer thread pool could not be created.
    #[error("failed to create timer thread pool: {0}")]
    ThreadPool(#[from] std::io::Error),

    /// No timer facility exists in the current execution context.
    #[error("no timer facility available in this execution context")]
    TimerUnavailable,
}

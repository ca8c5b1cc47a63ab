use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;

use crate::{
    DebounceConfig,
    debouncer::{Debouncer, SettledChanges},
    timing::Timer,
};

// Upstream items read per poll before yielding back to the executor.
const POLL_BUDGET: usize = 32;

pin_project! {
    /// A stream of settled values produced by debouncing another stream.
    ///
    /// Every upstream item is reported to an internal [`Debouncer`] and every
    /// settled value change is yielded. The initial value is not yielded.
    ///
    /// When the upstream ends, a pending trailing emission is flushed right away
    /// and the stream ends after it. A pending burst with trailing disabled is
    /// simply cancelled.
    #[must_use = "streams do nothing unless polled"]
    pub struct Debounced<S>
    where
        S: Stream,
    {
        #[pin]
        stream: S,
        debouncer: Option<Debouncer<S::Item>>,
        changes: SettledChanges<S::Item>,
    }
}

impl<S> Debounced<S>
where
    S: Stream,
    S::Item: Clone + PartialEq + Send + 'static,
{
    /// Wraps `stream`, feeding its items into `debouncer`.
    pub fn new(stream: S, debouncer: Debouncer<S::Item>) -> Self {
        let changes = debouncer.changes();
        Debounced {
            stream,
            debouncer: Some(debouncer),
            changes,
        }
    }

    /// The debouncer driving this stream, until the upstream has ended.
    pub fn debouncer(&self) -> Option<&Debouncer<S::Item>> {
        self.debouncer.as_ref()
    }
}

impl<S> Stream for Debounced<S>
where
    S: Stream,
    S::Item: Clone + PartialEq + Send + 'static,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let mut upstream_done = false;

        if let Some(debouncer) = this.debouncer.as_ref() {
            let mut budget = POLL_BUDGET;
            while let Poll::Ready(item) = this.stream.as_mut().poll_next(cx) {
                match item {
                    Some(value) => debouncer.set_value(value),
                    None => {
                        upstream_done = true;
                        break;
                    }
                }
                budget -= 1;
                if budget == 0 {
                    cx.waker().wake_by_ref();
                    break;
                }
            }
        }

        if upstream_done {
            if let Some(debouncer) = this.debouncer.take() {
                if debouncer.is_pending() && debouncer.config().options.trailing {
                    debouncer.flush();
                }
                // Dropping the debouncer cancels what is left and closes `changes`.
            }
        }

        this.changes.poll_next_unpin(cx)
    }
}

/// Extend `Stream` with debouncing.
pub trait DebounceExt: Stream {
    /// Debounces this stream on the shared thread pool timer.
    ///
    /// `initial` is the settled value before any item arrives.
    fn debounced(self, initial: Self::Item, config: impl Into<DebounceConfig>) -> Debounced<Self>
    where
        Self: Sized,
        Self::Item: Clone + PartialEq + Send + 'static,
    {
        Debounced::new(self, Debouncer::with_config(initial, config.into()))
    }

    /// Debounces this stream on the given timer facility.
    fn debounced_with_timer(
        self,
        initial: Self::Item,
        config: impl Into<DebounceConfig>,
        timer: impl Timer + 'static,
    ) -> Debounced<Self>
    where
        Self: Sized,
        Self::Item: Clone + PartialEq + Send + 'static,
    {
        Debounced::new(self, Debouncer::with_timer(initial, config, timer))
    }
}

impl<S> DebounceExt for S where S: Stream {}

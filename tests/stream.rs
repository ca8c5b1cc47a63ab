use std::time::Duration;

use futures::{FutureExt, StreamExt, stream};
use settle::{DebounceConfig, DebounceExt, DebounceOptions, ManualClock};

const DELAY: Duration = Duration::from_millis(30);

#[tokio::test(flavor = "multi_thread")]
async fn upstream_end_flushes_trailing_value() {
    let settled: Vec<_> = stream::iter(vec![1, 2, 3])
        .debounced(0, DELAY)
        .collect()
        .await;
    assert_eq!(settled, vec![3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn leading_and_trailing_on_stream() {
    let config = DebounceConfig::new(DELAY).with_options(DebounceOptions::new().leading(true));
    let settled: Vec<_> = stream::iter(vec![1, 2, 3])
        .debounced(0, config)
        .collect()
        .await;
    assert_eq!(settled, vec![1, 3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn leading_only_drops_pending_burst_on_end() {
    let config = DebounceConfig::new(DELAY)
        .with_options(DebounceOptions::new().leading(true).trailing(false));
    let settled: Vec<_> = stream::iter(vec![1, 2, 3])
        .debounced(0, config)
        .collect()
        .await;
    assert_eq!(settled, vec![1]);
}

#[tokio::test(flavor = "multi_thread")]
async fn quiet_gap_splits_bursts() {
    let bursts = vec![vec![1, 2], vec![3, 4]];
    let upstream = stream::iter(bursts).then(|burst| async move {
        tokio::time::sleep(DELAY * 5).await;
        stream::iter(burst)
    });
    let settled: Vec<_> = upstream.flatten().debounced(0, DELAY).collect().await;
    assert_eq!(settled, vec![2, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unchanged_items_are_not_emitted() {
    let settled: Vec<_> = stream::iter(vec![0, 0, 0])
        .debounced(0, DELAY)
        .collect()
        .await;
    assert!(settled.is_empty(), "Items equal to the initial value never settle");
}

#[test]
fn stream_on_manual_clock() {
    let clock = ManualClock::new();
    let (sender, receiver) = futures::channel::mpsc::unbounded();
    let mut settled = receiver.debounced_with_timer("", DELAY, clock.clone());

    sender.unbounded_send("a").unwrap();
    sender.unbounded_send("b").unwrap();
    assert_eq!(settled.next().now_or_never(), None);
    assert!(settled.debouncer().unwrap().is_pending());

    clock.advance(DELAY);
    assert_eq!(settled.next().now_or_never(), Some(Some("b")));

    drop(sender);
    assert_eq!(settled.next().now_or_never(), Some(None));
    assert!(settled.debouncer().is_none());
}

#[test]
fn endless_upstream_yields_between_polls() {
    let clock = ManualClock::new();
    let mut settled = stream::repeat(1).debounced_with_timer(0, DELAY, clock.clone());

    assert_eq!(settled.next().now_or_never(), None, "Poll returns despite a ready upstream");
    assert!(settled.debouncer().unwrap().is_pending());

    clock.advance(DELAY);
    assert_eq!(settled.next().now_or_never(), Some(Some(1)));
}

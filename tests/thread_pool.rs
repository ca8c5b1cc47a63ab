use std::time::{Duration, Instant};

use futures::StreamExt;
use settle::{DebounceOptions, Debouncer, ThreadPoolTimer};
use tokio::time::{sleep, timeout};

const DELAY: Duration = Duration::from_millis(40);
const SLOW: Duration = Duration::from_millis(500);
const FAST: Duration = Duration::from_millis(20);
// Generous bound for FAST on a loaded machine, still well under SLOW.
const FAST_BOUND: Duration = Duration::from_millis(200);

#[tokio::test(flavor = "multi_thread")]
async fn default_timer_settles_last_value() {
    let debouncer = Debouncer::new(String::new(), DELAY);
    let mut changes = debouncer.changes();

    for query in ["r", "ru", "rus", "rust"] {
        debouncer.set_value(query.to_string());
    }
    assert_eq!(debouncer.debounced_value(), "");

    let settled = timeout(Duration::from_secs(2), changes.next())
        .await
        .expect("Trailing emission should arrive");
    assert_eq!(settled.as_deref(), Some("rust"));
    assert_eq!(debouncer.debounced_value(), "rust");
    assert!(!debouncer.is_pending());
}

#[tokio::test(flavor = "multi_thread")]
async fn leading_edge_is_immediate_on_pool() {
    let debouncer = Debouncer::with_options(0, DELAY, DebounceOptions::new().leading(true));
    let mut changes = debouncer.changes();

    debouncer.set_value(1);
    debouncer.set_value(2);
    assert_eq!(changes.next().await, Some(1));

    let trailing = timeout(Duration::from_secs(2), changes.next()).await.unwrap();
    assert_eq!(trailing, Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_prevents_emission_on_pool() {
    let debouncer = Debouncer::new(0, DELAY);

    debouncer.set_value(1);
    debouncer.cancel();
    sleep(DELAY * 3).await;
    assert_eq!(debouncer.debounced_value(), 0, "Canceled timer must not fire");
}

#[tokio::test(flavor = "multi_thread")]
async fn teardown_closes_changes() {
    let debouncer = Debouncer::new(0, DELAY);
    let mut changes = debouncer.changes();

    debouncer.set_value(1);
    drop(debouncer);
    assert_eq!(changes.next().await, None);
    sleep(DELAY * 2).await;
    assert_eq!(changes.next().await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn single_thread_pool_is_not_blocked_by_canceled_timers() {
    let timer = ThreadPoolTimer::new(1).unwrap();
    let debouncer = Debouncer::with_timer(0, Duration::from_millis(20), timer);
    let mut changes = debouncer.changes();

    for i in 1..=50 {
        debouncer.set_value(i);
    }

    let settled = timeout(Duration::from_secs(2), changes.next()).await.unwrap();
    assert_eq!(settled, Some(50));
}

#[tokio::test(flavor = "multi_thread")]
async fn waiting_timer_does_not_hold_up_shorter_one() {
    let timer = ThreadPoolTimer::new(1).unwrap();
    let slow = Debouncer::with_timer(0, SLOW, timer.clone());
    let fast = Debouncer::with_timer(0, FAST, timer);
    let mut fast_changes = fast.changes();

    slow.set_value(1);
    let start = Instant::now();
    fast.set_value(1);

    let settled = timeout(Duration::from_secs(2), fast_changes.next())
        .await
        .expect("Fast debouncer should settle");
    let elapsed = start.elapsed();
    assert_eq!(settled, Some(1));
    assert!(
        elapsed < FAST_BOUND,
        "Fast debouncer took {elapsed:?} behind a slow one on a single thread pool"
    );
    assert_eq!(slow.debounced_value(), 0, "Slow debouncer is still waiting");
}

#[tokio::test(flavor = "multi_thread")]
async fn instances_are_isolated_on_shared_pool() {
    let slow: Vec<_> = (0..70).map(|_| Debouncer::new(0, SLOW)).collect();
    for debouncer in &slow {
        debouncer.set_value(1);
    }
    let mut slow_changes: Vec<_> = slow.iter().map(|debouncer| debouncer.changes()).collect();

    let fast = Debouncer::new(0, FAST);
    let mut fast_changes = fast.changes();
    let start = Instant::now();
    fast.set_value(1);

    let settled = timeout(Duration::from_secs(2), fast_changes.next())
        .await
        .expect("Fast debouncer should settle");
    let elapsed = start.elapsed();
    assert_eq!(settled, Some(1));
    assert!(
        elapsed < FAST_BOUND,
        "Fast debouncer took {elapsed:?} with more pending timers than pool threads"
    );
    assert!(
        slow.iter().all(|debouncer| debouncer.is_pending()),
        "Slow debouncers are unaffected by the fast one"
    );

    for changes in &mut slow_changes {
        let settled = timeout(Duration::from_secs(2), changes.next())
            .await
            .expect("Every slow debouncer should settle on its own");
        assert_eq!(settled, Some(1));
    }
}

//! Graceful shutdown integration tests.
//!
//! Tests that verify the clock waits for running callbacks before
//! stopping, retires pending jobs, and stops when its last handle drops.

use hourglass::testing::{FireCounter, wait_for_fired};
use hourglass::{Callback, Clock, ClockConfig, ClockError, Schedule, YamlLoader};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_shutdown_waits_for_running_callback() {
    let clock = Clock::new();
    let completed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&completed);

    clock
        .schedule(
            Schedule::once(Duration::from_millis(10)),
            Some(Callback::from_async(move || {
                let flag = Arc::clone(&flag);
                async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    flag.store(true, Ordering::SeqCst);
                }
            })),
        )
        .unwrap();
    wait_for_fired(&clock, 1, Duration::from_secs(2)).await;

    clock.shutdown().await.unwrap();
    assert!(completed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_shutdown_timeout_reports_stuck_callbacks() {
    let config = ClockConfig::default().with_shutdown_timeout(Duration::from_millis(100));
    let clock = Clock::with_config(config);

    for _ in 0..2 {
        clock
            .schedule(
                Schedule::once(Duration::from_millis(10)),
                Some(Callback::from_async(|| {
                    tokio::time::sleep(Duration::from_secs(10))
                })),
            )
            .unwrap();
    }
    wait_for_fired(&clock, 2, Duration::from_secs(2)).await;

    assert_eq!(clock.shutdown().await, Err(ClockError::ShutdownTimeout(2)));
}

#[tokio::test]
async fn test_shutdown_stops_future_firings() {
    let clock = Clock::new();
    let counter = FireCounter::new();
    let job = clock
        .add_repeating(Duration::from_millis(20), 0, counter.hook())
        .unwrap();
    let pending = clock
        .schedule(Schedule::once(Duration::from_secs(30)), None)
        .unwrap();
    wait_for_fired(&clock, 2, Duration::from_secs(2)).await;

    clock.shutdown().await.unwrap();
    let fired = clock.total_fired();

    assert!(job.is_retired());
    assert!(pending.is_retired());
    assert_eq!(clock.pending_count(), 0);
    assert!(!clock.delete(&pending));
    assert_eq!(
        clock.add_once(Duration::from_millis(10), || {}).unwrap_err(),
        ClockError::Stopped
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(clock.total_fired(), fired);
}

#[tokio::test]
async fn test_dropping_every_handle_closes_streams() {
    let clock = Clock::new();
    let job = clock
        .schedule(Schedule::every(Duration::from_secs(60)), None)
        .unwrap();
    let mut notifications = job.notifications();

    let worker = {
        let clock = clock.clone();
        tokio::spawn(async move { clock.pending_count() })
    };
    assert_eq!(worker.await.unwrap(), 1);
    drop(clock);

    let closed = tokio::time::timeout(Duration::from_secs(1), notifications.recv()).await;
    assert_eq!(closed, Ok(None));
    assert!(job.is_retired());
}

#[tokio::test]
async fn test_clock_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name: yaml-clock\nshutdown_timeout_ms: 50\ndispatch_batch: 2").unwrap();

    let config = YamlLoader::load_clock_config(file.path()).unwrap();
    let clock = Clock::with_config(config);
    assert_eq!(clock.config().name, "yaml-clock");

    for _ in 0..5 {
        clock.add_once(Duration::from_millis(10), || {}).unwrap();
    }
    wait_for_fired(&clock, 5, Duration::from_secs(2)).await;
    clock.shutdown().await.unwrap();
}

//! Deletion integration tests.
//!
//! Tests that verify single and bulk deletes are idempotent, stop all
//! future firings, and hold up under concurrent callers.

use crate::common::next_firing;
use hourglass::testing::FireCounter;
use hourglass::{Clock, Job, Schedule};
use std::time::Duration;

#[tokio::test]
async fn test_delete_twice_reports_true_then_false() {
    let clock = Clock::new();
    let counter = FireCounter::new();
    let job = clock
        .add_once(Duration::from_millis(200), counter.hook())
        .unwrap();

    assert!(clock.delete(&job));
    assert!(!clock.delete(&job));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(counter.count(), 0);
    assert_eq!(clock.total_fired(), 0);
}

#[tokio::test]
async fn test_delete_after_firing_is_not_found() {
    let clock = Clock::new();
    let job = clock
        .schedule(Schedule::once(Duration::from_millis(10)), None)
        .unwrap();

    next_firing(&job, Duration::from_secs(2)).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(job.is_retired());
    assert!(!clock.delete(&job));
}

#[tokio::test]
async fn test_deleting_armed_job_keeps_later_ones_on_time() {
    let clock = Clock::new();
    let early = clock
        .schedule(Schedule::once(Duration::from_millis(50)), None)
        .unwrap();
    let later = clock
        .schedule(Schedule::once(Duration::from_millis(100)), None)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(clock.delete(&early));
    let firing = next_firing(&later, Duration::from_secs(2)).await.unwrap();

    assert!(firing.lateness() < Duration::from_millis(500));
    assert_eq!(early.fire_count(), 0);
    assert_eq!(clock.total_fired(), 1);
}

#[tokio::test]
async fn test_delete_many_clears_everything() {
    let clock = Clock::new();
    let counter = FireCounter::new();

    let mut jobs: Vec<Job> = (0..1000u64)
        .map(|i| {
            clock
                .add_once(Duration::from_millis(200 + i % 100), counter.hook())
                .unwrap()
        })
        .collect();
    jobs.extend((0..100).map(|_| {
        clock
            .add_repeating(Duration::from_millis(150), 0, counter.hook())
            .unwrap()
    }));
    assert_eq!(clock.pending_count(), 1100);

    assert_eq!(clock.delete_many(&jobs), 1100);
    assert_eq!(clock.pending_count(), 0);
    assert!(jobs.iter().all(Job::is_retired));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(counter.count(), 0);
    assert_eq!(clock.total_fired(), 0);
    assert_eq!(clock.delete_many(&jobs), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_and_delete() {
    let clock = Clock::new();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let clock = clock.clone();
            tokio::spawn(async move {
                let mut deleted = 0;
                for i in 0..2000u64 {
                    let job = clock
                        .schedule(Schedule::once(Duration::from_millis(1000 + i % 1000)), None)
                        .unwrap();
                    if clock.delete(&job) {
                        deleted += 1;
                    }
                }
                deleted
            })
        })
        .collect();

    let mut total = 0;
    for worker in workers {
        total += worker.await.unwrap();
    }

    assert_eq!(total, 16_000);
    assert_eq!(clock.pending_count(), 0);
    assert_eq!(clock.total_fired(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_dispatch_never_double_counts() {
    let clock = Clock::new();
    let jobs: Vec<Job> = (0..2000)
        .map(|_| {
            clock
                .schedule(Schedule::every(Duration::from_millis(5)), None)
                .unwrap()
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let removed: usize = jobs.iter().map(|job| usize::from(clock.delete(job))).sum();
    let fired = clock.total_fired();

    assert_eq!(removed, 2000);
    assert_eq!(clock.pending_count(), 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(clock.total_fired(), fired);
}

//! Scale integration tests.
//!
//! Tests that verify the clock handles hundreds of thousands of pending
//! jobs with randomized deadlines.

use hourglass::testing::wait_for_fired;
use hourglass::{Clock, Job, Schedule};
use rand::{Rng, SeedableRng};
use std::time::Duration;

const JOBS: usize = 200_000;

/// `JOBS` delays drawn uniformly from [1s, 2s).
fn random_delays() -> impl Iterator<Item = Duration> {
    let mut rng = rand::rngs::StdRng::from_entropy();
    (0..JOBS).map(move |_| Duration::from_millis(rng.gen_range(1000..2000)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_hundred_thousand_one_shots() {
    let clock = Clock::new();
    let jobs: Vec<Job> = random_delays()
        .map(|delay| clock.schedule(Schedule::once(delay), None).unwrap())
        .collect();
    assert_eq!(clock.pending_count(), JOBS);

    wait_for_fired(&clock, JOBS as u64, Duration::from_secs(10)).await;

    assert_eq!(clock.total_fired(), JOBS as u64);
    assert_eq!(clock.pending_count(), 0);
    for job in &jobs {
        assert_eq!(job.fire_count(), 1);
        assert!(job.is_retired());

        let mut notifications = job.notifications();
        let firing = notifications.recv().await.unwrap();
        assert_eq!(firing.job_id, job.id());
        assert_eq!(firing.sequence, 1);
        assert!(notifications.recv().await.is_none());
    }

    let worst = jobs
        .iter()
        .filter_map(|job| job.notifications().latest())
        .map(|firing| firing.lateness())
        .max()
        .unwrap_or_default();
    assert!(worst < Duration::from_secs(2), "worst lateness {:?}", worst);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bulk_delete_at_scale() {
    let clock = Clock::new();
    let jobs: Vec<Job> = random_delays()
        .map(|delay| clock.add_once(delay, || {}).unwrap())
        .collect();

    assert_eq!(clock.delete_many(&jobs), JOBS);
    assert_eq!(clock.pending_count(), 0);

    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(clock.total_fired(), 0);
}

//! hourglass - Load and latency harness for the Hourglass clock.
//!
//! Usage:
//!   hourglass bench --jobs <N>     Fire N one-shot jobs and report lateness
//!   hourglass churn --jobs <N>     Add then bulk-delete N jobs
//!   hourglass tick                 Print the firings of one repeating job

use clap::{Parser, Subcommand};
use futures::StreamExt;
use hourglass::{Clock, ClockConfig, Job, Schedule, YamlLoader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// hourglass - Load and latency harness for the Hourglass clock
#[derive(Parser)]
#[command(name = "hourglass")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Clock configuration file (YAML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule one-shot jobs at random delays and measure firing lateness
    Bench {
        /// Number of jobs to schedule
        #[arg(short = 'n', long, default_value = "200000")]
        jobs: usize,

        /// Minimum delay in milliseconds
        #[arg(long, default_value = "1000")]
        base_ms: u64,

        /// Random extra delay in milliseconds, added to the base
        #[arg(long, default_value = "1000")]
        spread_ms: u64,
    },

    /// Add jobs then delete them all in one batch
    Churn {
        /// Number of jobs to add and delete
        #[arg(short = 'n', long, default_value = "200000")]
        jobs: usize,
    },

    /// Run one repeating job and print each firing
    Tick {
        /// Interval between firings in milliseconds
        #[arg(short, long, default_value = "500")]
        interval_ms: u64,

        /// Number of firings (0 = until Ctrl+C)
        #[arg(short, long, default_value = "10")]
        times: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading clock configuration from: {}", path.display());
            YamlLoader::load_clock_config(path)?
        }
        None => ClockConfig::default(),
    };

    match cli.command {
        Commands::Bench {
            jobs,
            base_ms,
            spread_ms,
        } => {
            run_bench(config, jobs, base_ms, spread_ms).await?;
        }
        Commands::Churn { jobs } => {
            run_churn(config, jobs).await?;
        }
        Commands::Tick { interval_ms, times } => {
            run_tick(config, interval_ms, times).await?;
        }
    }

    Ok(())
}

/// Fire `count` one-shot jobs and report how late they were.
async fn run_bench(
    config: ClockConfig,
    count: usize,
    base_ms: u64,
    spread_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::with_config(config);

    info!(
        "Scheduling {} job(s) between {}ms and {}ms out",
        count,
        base_ms,
        base_ms + spread_ms
    );
    let start = Instant::now();
    let mut rng = StdRng::from_entropy();
    let mut jobs: Vec<Job> = Vec::with_capacity(count);
    for _ in 0..count {
        let jitter = if spread_ms == 0 {
            0
        } else {
            rng.gen_range(0..spread_ms)
        };
        let delay = Duration::from_millis(base_ms + jitter);
        jobs.push(clock.schedule(Schedule::once(delay), None)?);
    }
    info!("Scheduled in {:?}", start.elapsed());

    let horizon = Duration::from_millis(base_ms + spread_ms) + Duration::from_secs(5);
    let target = count as u64;
    if !hourglass::testing::wait_until(horizon, || clock.total_fired() >= target).await {
        warn!(
            "Only {} of {} job(s) fired within {:?}",
            clock.total_fired(),
            count,
            horizon
        );
    }

    let lateness: Vec<Duration> = jobs
        .iter()
        .filter_map(|job| job.notifications().latest())
        .map(|firing| firing.lateness())
        .collect();
    let total: Duration = lateness.iter().sum();
    let max = lateness.iter().max().copied().unwrap_or_default();
    let avg = u32::try_from(lateness.len())
        .ok()
        .filter(|n| *n > 0)
        .map(|n| total / n)
        .unwrap_or_default();

    println!("Fired:        {}/{}", clock.total_fired(), count);
    println!("Pending:      {}", clock.pending_count());
    println!("Avg lateness: {:?}", avg);
    println!("Max lateness: {:?}", max);

    clock.shutdown().await?;
    Ok(())
}

/// Add `count` jobs and remove them again with a single bulk delete.
async fn run_churn(config: ClockConfig, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::with_config(config);
    let mut rng = StdRng::from_entropy();

    let start = Instant::now();
    let mut jobs: Vec<Job> = Vec::with_capacity(count);
    for _ in 0..count {
        let delay = Duration::from_millis(rng.gen_range(1000..2000));
        jobs.push(clock.add_once(delay, || {})?);
    }
    let added = start.elapsed();

    let start = Instant::now();
    let removed = clock.delete_many(&jobs);
    let deleted = start.elapsed();

    let rate = count as f64 / (added + deleted).as_secs_f64().max(f64::EPSILON);
    println!("Added:     {} in {:?}", count, added);
    println!("Deleted:   {} in {:?}", removed, deleted);
    println!("Pending:   {}", clock.pending_count());
    println!("Throughput: {:.0} add+delete pairs/s", rate);

    clock.shutdown().await?;
    Ok(())
}

/// Print the firings of one repeating job.
async fn run_tick(
    config: ClockConfig,
    interval_ms: u64,
    times: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::with_config(config);
    let job = clock.schedule(
        Schedule::repeating(Duration::from_millis(interval_ms), times),
        None,
    )?;
    info!("Started {} (every {}ms)", job.id(), interval_ms);
    info!("Press Ctrl+C to stop");

    let mut firings = job.notifications().into_stream();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                clock.delete(&job);
                break;
            }
            firing = firings.next() => match firing {
                Some(firing) => println!(
                    "{} #{} (late by {:?})",
                    firing.job_id,
                    firing.sequence,
                    firing.lateness()
                ),
                None => break,
            },
        }
    }

    clock.shutdown().await?;
    info!("Goodbye!");
    Ok(())
}

//! Job Scheduler
//!
//! Runs every collection job once as soon as it is started, then again on
//! each elapsed interval until stopped. Each finished run is published as a
//! `JobCompleted` event on a broadcast channel the scheduler owns; merging and
//! caching happen inside the jobs themselves.
//!
//! Runs are spawned, never awaited by the ticker, so a slow job cannot delay
//! the timer. By default a job whose previous run is still in flight is
//! skipped for that tick (`TickOverlap::Skip`).

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::app::CollectionJob;
use crate::domain::entities::MetricsSnapshot;
use crate::error::SchedulerError;

/// Default collection interval (10 minutes)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(600_000);

const EVENT_CAPACITY: usize = 16;

/// Completion event carrying one job's result
#[derive(Debug, Clone)]
pub struct JobCompleted {
    pub job: String,
    pub snapshot: MetricsSnapshot,
    pub completed_at: DateTime<Utc>,
}

/// What to do when a tick arrives while the same job is still running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickOverlap {
    #[default]
    Skip,
    Allow,
}

impl FromStr for TickOverlap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(TickOverlap::Skip),
            "allow" => Ok(TickOverlap::Allow),
            _ => Err(format!("Unknown tick overlap policy: {}", s)),
        }
    }
}

#[derive(Clone)]
struct ScheduledJob {
    job: Arc<dyn CollectionJob>,
    running: Arc<AtomicBool>,
}

/// Clears a job's running flag when its run ends, even by panic
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct JobScheduler {
    jobs: Vec<ScheduledJob>,
    interval: Duration,
    overlap: TickOverlap,
    events: broadcast::Sender<JobCompleted>,
    cancel: CancellationToken,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(
        jobs: Vec<Arc<dyn CollectionJob>>,
        interval: Duration,
    ) -> Result<Self, SchedulerError> {
        if jobs.is_empty() {
            return Err(SchedulerError::NoJobs);
        }
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let jobs = jobs
            .into_iter()
            .map(|job| ScheduledJob {
                job,
                running: Arc::new(AtomicBool::new(false)),
            })
            .collect();

        Ok(Self {
            jobs,
            interval,
            overlap: TickOverlap::default(),
            events,
            cancel: CancellationToken::new(),
            timer: Mutex::new(None),
        })
    }

    pub fn with_overlap(mut self, overlap: TickOverlap) -> Self {
        self.overlap = overlap;
        self
    }

    /// Subscribe to completion events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<JobCompleted> {
        self.events.subscribe()
    }

    /// Run every job now and arm the repeating timer.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if timer.is_some() {
            return Err(SchedulerError::AlreadyStarted);
        }

        tracing::info!(
            jobs = self.jobs.len(),
            interval_ms = self.interval.as_millis() as u64,
            overlap = ?self.overlap,
            "Job scheduler started"
        );

        for job in &self.jobs {
            dispatch(job, &self.events, self.overlap);
        }

        let jobs = self.jobs.clone();
        let events = self.events.clone();
        let cancel = self.cancel.clone();
        let period = self.interval;
        let overlap = self.overlap;

        *timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Job scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        for job in &jobs {
                            dispatch(job, &events, overlap);
                        }
                    }
                }
            }
        }));

        Ok(())
    }

    /// Cancel the repeating timer. Runs already in flight finish normally.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn dispatch(job: &ScheduledJob, events: &broadcast::Sender<JobCompleted>, overlap: TickOverlap) {
    let guard = match overlap {
        TickOverlap::Skip => {
            if job.running.swap(true, Ordering::SeqCst) {
                tracing::warn!(job = %job.job.name(), "Previous run still in progress, skipping tick");
                return;
            }
            Some(RunningGuard(job.running.clone()))
        }
        TickOverlap::Allow => None,
    };

    let job = job.job.clone();
    let events = events.clone();

    tokio::spawn(async move {
        let _guard = guard;
        tracing::debug!(job = %job.name(), "Running job");

        let snapshot = job.run().await;
        let event = JobCompleted {
            job: job.name().to_string(),
            snapshot,
            completed_at: Utc::now(),
        };

        if events.send(event).is_err() {
            tracing::debug!(job = %job.name(), "No subscribers for job completion");
        }
    });
}

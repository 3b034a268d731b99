//! Address-space server runtime.
//!
//! Owns the node store and a scheduler of repeated jobs, and drives both
//! from one cooperative loop: jobs, reads and writes never run concurrently
//! with each other, so the node store needs no locking.

use crate::address_space::{AddressSpace, MemoryAddressSpace, StatusCode};
use log::{debug, info};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Unit of work the scheduler runs on a fixed interval.
///
/// Runs on the server loop, so it must not block for long and must not
/// panic; failures are the job's own business.
pub trait RepeatedJob: Send {
    fn name(&self) -> &str;

    fn run(&mut self, space: &mut dyn AddressSpace);
}

/// A closure registered as a repeated job.
pub struct FnJob<F> {
    name: String,
    f: F,
}

impl<F> FnJob<F>
where
    F: FnMut(&mut dyn AddressSpace) + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> RepeatedJob for FnJob<F>
where
    F: FnMut(&mut dyn AddressSpace) + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, space: &mut dyn AddressSpace) {
        (self.f)(space)
    }
}

/// Handle of a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

struct ScheduledJob {
    id: JobId,
    job: Box<dyn RepeatedJob>,
    interval: Duration,
    next_due: Instant,
}

pub struct Server {
    space: MemoryAddressSpace,
    jobs: Vec<ScheduledJob>,
    next_job_id: u64,
}

impl Server {
    pub fn new() -> Self {
        Self::with_address_space(MemoryAddressSpace::new())
    }

    pub fn with_address_space(space: MemoryAddressSpace) -> Self {
        Self {
            space,
            jobs: Vec::new(),
            next_job_id: 0,
        }
    }

    pub fn address_space(&self) -> &MemoryAddressSpace {
        &self.space
    }

    pub fn address_space_mut(&mut self) -> &mut MemoryAddressSpace {
        &mut self.space
    }

    /// Register `job` to run every `interval`, first one interval from now.
    pub fn add_repeated_job(
        &mut self,
        job: Box<dyn RepeatedJob>,
        interval: Duration,
    ) -> Result<JobId, StatusCode> {
        if interval.is_zero() {
            return Err(StatusCode::BAD_INVALID_ARGUMENT);
        }
        let id = JobId(self.next_job_id);
        self.next_job_id += 1;
        info!(
            "[Server] Registered job '{}' every {:?}",
            job.name(),
            interval
        );
        self.jobs.push(ScheduledJob {
            id,
            job,
            interval,
            next_due: Instant::now() + interval,
        });
        Ok(id)
    }

    pub fn remove_repeated_job(&mut self, id: JobId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|scheduled| scheduled.id != id);
        self.jobs.len() != before
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Earliest instant at which a job is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.jobs.iter().map(|scheduled| scheduled.next_due).min()
    }

    /// Run every job due at `now`, in registration order. Returns how many ran.
    ///
    /// A job that fell behind runs once and is rescheduled one interval
    /// after `now`; missed ticks are not replayed.
    pub fn run_due_jobs(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        for scheduled in self.jobs.iter_mut().filter(|s| s.next_due <= now) {
            debug!("[Server] Running job '{}'", scheduled.job.name());
            scheduled.job.run(&mut self.space);
            scheduled.next_due = now + scheduled.interval;
            ran += 1;
        }
        ran
    }

    /// Drive the scheduler until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between job runs; a running job finishes
    /// first. Returns the run loop's final status.
    pub async fn run(&mut self, shutdown: CancellationToken) -> StatusCode {
        info!("[Server] Run loop started with {} job(s)", self.jobs.len());
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = wait_until(deadline) => {
                    self.run_due_jobs(Instant::now());
                }
            }
        }
        info!("[Server] Run loop stopped");
        StatusCode::GOOD
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

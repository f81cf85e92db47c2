//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - Periodic sweep of expired OTP records (every minute by default)
//!
//! # Architecture
//!
//! The sweep is a safety net beside the per-record deferred deletion that the
//! store schedules on insert. Both are idempotent, so either may run first.
//!
//! ```text
//! Scheduler (every minute)
//!     │
//!     └─► OtpService::sweep_expired()
//!             └─► OtpStore::sweep_expired(now) → removes expires_at < now
//! ```

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::otp::OtpService;

/// Start all scheduled tasks
pub async fn start_scheduler(service: OtpService, sweep_schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_service = service.clone();
    let sweep_job = Job::new_async(sweep_schedule, move |_uuid, _lock| {
        let service = sweep_service.clone();
        Box::pin(async move {
            run_sweep(&service).await;
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = sweep_schedule, "Scheduled tasks started (expired OTP sweep)");
    Ok(scheduler)
}

/// Run one sweep tick.
///
/// A panicking tick is logged and skipped; stale records are then left for
/// their deferred deletion or the next tick.
async fn run_sweep(service: &OtpService) {
    let service = service.clone();
    if let Err(e) = tokio::spawn(async move { service.sweep_expired().await }).await {
        tracing::error!("OTP sweep task failed: {}", e);
    }
}

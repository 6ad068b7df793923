//! Core [`Poller`] struct: one recurring tokio task with a single-flight guard.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlmap_core::ReloadConfig;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::service::{ReloadService, TickOutcome};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Runs [`ReloadService::tick`] after an initial delay and then at a fixed
/// rate, measured between tick starts.
///
/// Ticks never overlap: they run one after the other inside the timer task,
/// ticks missed while one was running are skipped, and a tick is also skipped
/// while an earlier one is still finishing on the blocking pool. Tick errors
/// are logged and do not stop the poller.
pub struct Poller {
    service: Arc<ReloadService>,
    initial_delay: Duration,
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
    in_flight: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    skipped: Arc<AtomicU64>,
}

/// Clears the in-flight flag when the blocking tick ends, even if it panics.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Poller {
    /// Create a stopped poller. A zero `period` is raised to one millisecond.
    pub fn new(service: Arc<ReloadService>, initial_delay: Duration, period: Duration) -> Self {
        Self {
            service,
            initial_delay,
            period: period.max(MIN_PERIOD),
            handle: Mutex::new(None),
            in_flight: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(service: Arc<ReloadService>, config: &ReloadConfig) -> Self {
        Self::new(service, config.initial_delay, config.period)
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the recurring task. Returns false if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut handle = self.handle.lock().expect("poller handle lock poisoned");
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("mapping reload poller already running");
            return false;
        }

        let service = Arc::clone(&self.service);
        let in_flight = Arc::clone(&self.in_flight);
        let ticks = Arc::clone(&self.ticks);
        let skipped = Arc::clone(&self.skipped);
        let start = Instant::now() + self.initial_delay;
        let period = self.period;

        *handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                run_tick(&service, &in_flight, &ticks, &skipped).await;
            }
        }));

        info!(
            initial_delay_ms = self.initial_delay.as_millis() as u64,
            period_ms = self.period.as_millis() as u64,
            "mapping reload poller started"
        );
        true
    }

    /// Cancel the recurring task without waiting for an in-flight tick.
    /// Returns false if it was not running.
    pub fn stop(&self) -> bool {
        let handle = self
            .handle
            .lock()
            .expect("poller handle lock poisoned")
            .take();
        match handle {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                info!(ticks = self.tick_count(), "mapping reload poller stopped");
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .expect("poller handle lock poisoned")
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Ticks that ran to completion, successful or not.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks skipped because an earlier tick was still running.
    pub fn skipped_count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}

async fn run_tick(
    service: &Arc<ReloadService>,
    in_flight: &Arc<AtomicBool>,
    ticks: &AtomicU64,
    skipped: &AtomicU64,
) {
    if in_flight.swap(true, Ordering::AcqRel) {
        skipped.fetch_add(1, Ordering::Relaxed);
        warn!("previous mapping reload tick still running, skipping tick");
        return;
    }

    let service = Arc::clone(service);
    let guard = InFlight(Arc::clone(in_flight));
    let result = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        service.tick()
    })
    .await;
    ticks.fetch_add(1, Ordering::Relaxed);

    match result {
        Ok(Ok(TickOutcome::Unchanged)) => {}
        Ok(Ok(TickOutcome::Reloaded { report, .. })) => {
            debug!(generation = report.generation, "reload tick published generation");
        }
        Ok(Err(e)) => error!(error = %e, "mapping reload tick failed"),
        Err(e) => error!(error = %e, "mapping reload tick panicked"),
    }
}

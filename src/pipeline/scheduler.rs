//! Poll scheduler: authenticates once, then scans and replies on a timer.
//!
//! The interval is drawn once per start from the configured bounds and stays
//! fixed until `stop()`. Ticks run one after another on a single task; a
//! slow tick delays the next one rather than overlapping it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{AutoReplyConfig, IntervalBounds};
use crate::error::GmailError;
use crate::gmail::Authenticator;
use crate::pipeline::keywords::KeywordSet;
use crate::pipeline::labels::ensure_label;
use crate::pipeline::reply::{ReplyOutcome, ReplyWorker};
use crate::pipeline::scanner::InboxScanner;

/// Shortest interval a scheduler will run on.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Uniform integer in `[min_secs, max_secs]`, bounds in either order.
pub fn random_interval(min_secs: u64, max_secs: u64) -> u64 {
    let (lo, hi) = if min_secs <= max_secs {
        (min_secs, max_secs)
    } else {
        (max_secs, min_secs)
    };
    rand::thread_rng().gen_range(lo..=hi)
}

/// What the scheduler needs besides credentials.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub label_name: String,
    pub keywords: Arc<KeywordSet>,
    pub page_size: usize,
    pub interval: IntervalBounds,
}

impl PollSettings {
    pub fn from_config(config: &AutoReplyConfig) -> Self {
        Self {
            label_name: config.label_name.clone(),
            keywords: Arc::new(KeywordSet::new(&config.keywords)),
            page_size: config.page_size,
            interval: config.interval,
        }
    }
}

/// Result of a `start()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { interval: Duration },
    AlreadyRunning,
}

/// Per-tick counters, logged when the tick finishes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub candidates: usize,
    pub replied: usize,
    pub relabel_failed: usize,
    pub skipped: usize,
}

impl TickReport {
    fn record(&mut self, outcome: &ReplyOutcome) {
        match outcome {
            ReplyOutcome::Replied { .. } => self.replied += 1,
            ReplyOutcome::RepliedRelabelFailed { .. } => {
                self.replied += 1;
                self.relabel_failed += 1;
            }
            ReplyOutcome::AlreadyReplied
            | ReplyOutcome::AlreadyProcessed
            | ReplyOutcome::Malformed { .. } => self.skipped += 1,
        }
    }
}

/// One scan-and-reply pass. Stops at the first provider error.
pub async fn run_tick(
    scanner: &InboxScanner,
    worker: &ReplyWorker,
) -> Result<TickReport, GmailError> {
    let candidates = scanner.scan().await?;
    let mut report = TickReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    for candidate in &candidates {
        let outcome = worker.process(&candidate.message_id).await?;
        report.record(&outcome);
    }

    Ok(report)
}

/// Owns the background polling task.
///
/// `running` holds the generation of the live task, or 0 when idle.
pub struct PollScheduler {
    authenticator: Arc<dyn Authenticator>,
    settings: PollSettings,
    running: Arc<AtomicU64>,
    generation: AtomicU64,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(authenticator: Arc<dyn Authenticator>, settings: PollSettings) -> Self {
        Self {
            authenticator,
            settings,
            running: Arc::new(AtomicU64::new(0)),
            generation: AtomicU64::new(0),
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) != 0
    }

    /// Start polling unless already running. Returns immediately; credentials
    /// and the label are resolved on the background task.
    pub fn start(&self) -> StartOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .running
            .compare_exchange(0, generation, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Poll scheduler already running");
            return StartOutcome::AlreadyRunning;
        }

        let bounds = self.settings.interval;
        let interval = Duration::from_secs(random_interval(bounds.min_secs, bounds.max_secs))
            .max(MIN_INTERVAL);
        info!(interval_secs = interval.as_secs(), "Starting poll scheduler");

        let running = RunningGuard {
            flag: Arc::clone(&self.running),
            generation,
        };
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.authenticator),
            self.settings.clone(),
            interval,
            running,
        ));

        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }

        StartOutcome::Started { interval }
    }

    /// Abort the polling task. Returns whether it was running.
    pub fn stop(&self) -> bool {
        let task = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        let was_running = self.running.swap(0, Ordering::SeqCst) != 0;
        if was_running {
            info!("Poll scheduler stopped");
        }
        was_running
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        let task = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Clears the running flag when the polling task ends, however it ends.
struct RunningGuard {
    flag: Arc<AtomicU64>,
    generation: u64,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        // A newer start may already own the flag.
        let _ = self
            .flag
            .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Authenticate and resolve the managed label.
async fn prepare(
    authenticator: &dyn Authenticator,
    settings: &PollSettings,
) -> crate::error::Result<(InboxScanner, ReplyWorker)> {
    let client = authenticator.authenticate().await?;
    let label = ensure_label(client.as_ref(), &settings.label_name).await?;

    let scanner = InboxScanner::new(
        Arc::clone(&client),
        Arc::clone(&settings.keywords),
        settings.page_size,
    );
    Ok((scanner, ReplyWorker::new(client, label)))
}

async fn poll_loop(
    authenticator: Arc<dyn Authenticator>,
    settings: PollSettings,
    interval: Duration,
    _running: RunningGuard,
) {
    let (scanner, worker) = match prepare(authenticator.as_ref(), &settings).await {
        Ok(parts) => parts,
        Err(e) => {
            error!(error = %e, "Poll scheduler not started");
            return;
        }
    };

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match run_tick(&scanner, &worker).await {
            Ok(report) if report.candidates == 0 => debug!("No matching unread mail"),
            Ok(report) => info!(
                candidates = report.candidates,
                replied = report.replied,
                relabel_failed = report.relabel_failed,
                skipped = report.skipped,
                "Tick complete"
            ),
            Err(e) => error!(error = %e, "Tick aborted"),
        }
    }
}

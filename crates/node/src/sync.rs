//! The nodewatcher loop: full hierarchy sync at a fixed cadence, data
//! forwarding every cycle, sleep-paced to a target cycle length.

use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result as EyreResult;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, error};

/// The periodic, expensive hierarchy/configuration reconciliation task.
#[async_trait]
pub trait FullSync: Send + Sync {
    async fn run(&self) -> EyreResult<()>;
}

/// The every-cycle task uploading collected data toward the master node.
#[async_trait]
pub trait ForwardData: Send + Sync {
    async fn run(&self) -> EyreResult<()>;
}

/// Best-effort phase reporting, in the spirit of a process title.
/// Reports never affect control flow.
pub trait StatusReporter: Send + Sync {
    fn report(&self, status: &str);
}

/// Reports phases to the log at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, status: &str) {
        debug!("{status}");
    }
}

/// What to do when a collaborator fails mid-cycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the loop and let process supervision restart us.
    #[default]
    FailFast,
    /// Log the failure and keep cycling.
    Continue,
}

#[derive(Copy, Clone, Debug)]
pub struct SyncConfig {
    /// Minimum spacing between two full-sync invocations, measured from
    /// cycle start to cycle start.
    pub full_sync_interval: Duration,
    /// Target cycle length; shorter cycles sleep the remainder away.
    pub cycle: Duration,
    pub on_failure: FailurePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            full_sync_interval: Duration::from_secs(120),
            cycle: Duration::from_secs(10),
            on_failure: FailurePolicy::default(),
        }
    }
}

/// Drives the sync/forward cadence for one node instance.
///
/// Cycles run strictly sequentially: the full sync (when due) always
/// completes before the forward step, and the pacing sleep is the only
/// suspension point. There is no catch-up after a slow cycle.
pub struct SyncManager {
    config: SyncConfig,
    full_sync: Arc<dyn FullSync>,
    forward: Arc<dyn ForwardData>,
    reporter: Arc<dyn StatusReporter>,
    last_full_sync: Option<Instant>,
}

impl SyncManager {
    #[must_use]
    pub fn new(
        config: SyncConfig,
        full_sync: Arc<dyn FullSync>,
        forward: Arc<dyn ForwardData>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            config,
            full_sync,
            forward,
            reporter,
            last_full_sync: None,
        }
    }

    /// Runs until a collaborator fails under [`FailurePolicy::FailFast`].
    /// Stopping is the caller's concern; drop the future (e.g. through
    /// `tokio::select!`) to cancel between suspension points.
    pub async fn start(mut self) -> EyreResult<()> {
        debug!(
            interval = ?self.config.full_sync_interval,
            cycle = ?self.config.cycle,
            "starting node sync loop"
        );

        loop {
            self.cycle().await?;
        }
    }

    async fn cycle(&mut self) -> EyreResult<()> {
        let started = Instant::now();

        if self.full_sync_due(started) {
            debug!("starting sync with nodes");
            self.reporter.report("synchronizing node hierarchy");

            let outcome = self.full_sync.run().await;
            // Anchored to the cycle start: a long sync never pushes the
            // cadence forward, and a failed one is not retried early.
            self.last_full_sync = Some(started);
            self.absorb("full sync", outcome)?;
        }

        self.reporter.report("forwarding collected data");
        self.absorb("data forward", self.forward.run().await)?;

        let took = started.elapsed();
        if let Some(remaining) = self.config.cycle.checked_sub(took) {
            self.reporter.report(&format!("sleeping for {remaining:?}"));
            debug!(?remaining, "sleeping until next cycle");
            time::sleep(remaining).await;
        }

        Ok(())
    }

    fn full_sync_due(&self, now: Instant) -> bool {
        self.last_full_sync.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.full_sync_interval
        })
    }

    fn absorb(&self, task: &str, outcome: EyreResult<()>) -> EyreResult<()> {
        let Err(err) = outcome else {
            return Ok(());
        };

        match self.config.on_failure {
            FailurePolicy::FailFast => Err(err.wrap_err(format!("{task} failed"))),
            FailurePolicy::Continue => {
                error!("{task} failed: {err:#}");
                Ok(())
            }
        }
    }
}

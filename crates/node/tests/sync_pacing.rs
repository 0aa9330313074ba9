//! Pacing behavior of the sync loop, driven on the paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eyre::{bail, Result as EyreResult};
use tokio::time::{self, Instant};
use vigil_node::sync::{
    FailurePolicy, ForwardData, FullSync, StatusReporter, SyncConfig, SyncManager, TracingReporter,
};

/// Records when each invocation started (whole seconds since construction)
/// and optionally burns simulated time or fails.
struct Probe {
    origin: Instant,
    starts: Mutex<Vec<u64>>,
    busy: Duration,
    fail: bool,
}

impl Probe {
    fn new() -> Arc<Self> {
        Self::busy_for(Duration::ZERO)
    }

    fn busy_for(busy: Duration) -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            starts: Mutex::new(Vec::new()),
            busy,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            starts: Mutex::new(Vec::new()),
            busy: Duration::ZERO,
            fail: true,
        })
    }

    async fn invoked(&self) -> EyreResult<()> {
        self.starts
            .lock()
            .unwrap()
            .push(self.origin.elapsed().as_secs());

        if !self.busy.is_zero() {
            time::sleep(self.busy).await;
        }

        if self.fail {
            bail!("probe failure");
        }

        Ok(())
    }

    fn starts(&self) -> Vec<u64> {
        self.starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FullSync for Probe {
    async fn run(&self) -> EyreResult<()> {
        self.invoked().await
    }
}

#[async_trait]
impl ForwardData for Probe {
    async fn run(&self) -> EyreResult<()> {
        self.invoked().await
    }
}

fn config(interval_secs: u64, cycle_secs: u64, on_failure: FailurePolicy) -> SyncConfig {
    SyncConfig {
        full_sync_interval: Duration::from_secs(interval_secs),
        cycle: Duration::from_secs(cycle_secs),
        on_failure,
    }
}

fn manager(config: SyncConfig, full_sync: &Arc<Probe>, forward: &Arc<Probe>) -> SyncManager {
    SyncManager::new(
        config,
        Arc::clone(full_sync) as Arc<dyn FullSync>,
        Arc::clone(forward) as Arc<dyn ForwardData>,
        Arc::new(TracingReporter),
    )
}

#[tokio::test(start_paused = true)]
async fn full_sync_holds_cadence_forward_fires_every_cycle() {
    let full_sync = Probe::new();
    let forward = Probe::new();
    let loop_task = tokio::spawn(
        manager(config(120, 10, FailurePolicy::FailFast), &full_sync, &forward).start(),
    );

    time::sleep(Duration::from_secs(245)).await;
    loop_task.abort();

    // First cycle syncs immediately, then every 120s measured from cycle
    // starts.
    assert_eq!(full_sync.starts(), vec![0, 120, 240]);

    // The forward step runs in every 10s cycle.
    let forwards = forward.starts();
    assert_eq!(forwards.len(), 25);
    assert_eq!(forwards.first(), Some(&0));
    assert_eq!(forwards.last(), Some(&240));
}

#[tokio::test(start_paused = true)]
async fn slow_full_sync_does_not_drift_the_cadence() {
    // The sync itself burns three cycle lengths.
    let full_sync = Probe::busy_for(Duration::from_secs(30));
    let forward = Probe::new();
    let loop_task = tokio::spawn(
        manager(config(120, 10, FailurePolicy::FailFast), &full_sync, &forward).start(),
    );

    time::sleep(Duration::from_secs(121)).await;
    loop_task.abort();

    // Re-anchored to the cycle start, not to sync completion: the second
    // run lands at 120, not 130.
    assert_eq!(full_sync.starts(), vec![0, 120]);

    // The first forward only happens once the sync is done; that cycle
    // overran its target, so the second cycle starts (and forwards)
    // immediately, then pacing resumes.
    let forwards = forward.starts();
    assert_eq!(forwards[..3], [30, 30, 40]);
}

#[tokio::test(start_paused = true)]
async fn overlong_cycles_skip_the_pacing_sleep() {
    let full_sync = Probe::new();
    // Forwarding takes longer than the 10s target cycle.
    let forward = Probe::busy_for(Duration::from_secs(15));
    let loop_task = tokio::spawn(
        manager(
            config(10_000, 10, FailurePolicy::FailFast),
            &full_sync,
            &forward,
        )
        .start(),
    );

    time::sleep(Duration::from_secs(46)).await;
    loop_task.abort();

    // Back-to-back cycles with no sleep and no catch-up burst.
    assert_eq!(forward.starts(), vec![0, 15, 30, 45]);
    assert_eq!(full_sync.starts(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn continue_policy_keeps_the_loop_alive() {
    let full_sync = Probe::failing();
    let forward = Probe::new();
    let loop_task = tokio::spawn(
        manager(config(120, 10, FailurePolicy::Continue), &full_sync, &forward).start(),
    );

    time::sleep(Duration::from_secs(35)).await;

    assert!(!loop_task.is_finished());
    loop_task.abort();

    assert_eq!(forward.starts(), vec![0, 10, 20, 30]);
    // The failed sync is not retried before its next slot.
    assert_eq!(full_sync.starts(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn fail_fast_policy_surfaces_the_error() {
    let full_sync = Probe::new();
    let forward = Probe::failing();
    let loop_task = tokio::spawn(
        manager(config(120, 10, FailurePolicy::FailFast), &full_sync, &forward).start(),
    );

    let result = loop_task.await.unwrap();
    assert!(result.is_err());
}

#[derive(Default)]
struct RecordingReporter {
    reports: Mutex<Vec<String>>,
}

impl StatusReporter for RecordingReporter {
    fn report(&self, status: &str) {
        self.reports.lock().unwrap().push(status.to_owned());
    }
}

#[tokio::test(start_paused = true)]
async fn reporter_sees_each_phase() {
    let full_sync = Probe::new();
    let forward = Probe::new();
    let reporter = Arc::new(RecordingReporter::default());

    let loop_task = tokio::spawn(
        SyncManager::new(
            config(120, 10, FailurePolicy::FailFast),
            Arc::clone(&full_sync) as Arc<dyn FullSync>,
            Arc::clone(&forward) as Arc<dyn ForwardData>,
            Arc::clone(&reporter) as Arc<dyn StatusReporter>,
        )
        .start(),
    );

    time::sleep(Duration::from_secs(5)).await;
    loop_task.abort();

    let reports = reporter.reports.lock().unwrap().clone();
    assert_eq!(reports[0], "synchronizing node hierarchy");
    assert_eq!(reports[1], "forwarding collected data");
    assert!(reports[2].starts_with("sleeping for"));
}

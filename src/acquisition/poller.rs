//! Per-region polling tasks

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::decoder::{Snapshot, decode};
use crate::provider::Region;
use crate::types::{GraphicsRecord, PhysicsRecord, RegionKind, StaticInfoRecord};
use crate::{Result, TelemetryError};

/// Fan-out point for decoded snapshots.
///
/// Each poller is the only writer of its region's latest-value channel. The
/// same snapshot is also offered to the pipeline queue without blocking.
pub(crate) struct SnapshotPublisher {
    physics: watch::Sender<Option<Arc<PhysicsRecord>>>,
    graphics: watch::Sender<Option<Arc<GraphicsRecord>>>,
    static_info: watch::Sender<Option<Arc<StaticInfoRecord>>>,
    events: mpsc::Sender<Snapshot>,
}

/// Read side of the latest-value channels.
#[derive(Clone)]
pub(crate) struct LatestSnapshots {
    pub physics: watch::Receiver<Option<Arc<PhysicsRecord>>>,
    pub graphics: watch::Receiver<Option<Arc<GraphicsRecord>>>,
    pub static_info: watch::Receiver<Option<Arc<StaticInfoRecord>>>,
}

impl SnapshotPublisher {
    pub fn new(events: mpsc::Sender<Snapshot>) -> (Self, LatestSnapshots) {
        let (physics, physics_rx) = watch::channel(None);
        let (graphics, graphics_rx) = watch::channel(None);
        let (static_info, static_info_rx) = watch::channel(None);

        let latest = LatestSnapshots {
            physics: physics_rx,
            graphics: graphics_rx,
            static_info: static_info_rx,
        };
        (Self { physics, graphics, static_info, events }, latest)
    }

    pub fn publish(&self, snapshot: Snapshot) {
        match &snapshot {
            Snapshot::Physics(record) => {
                self.physics.send_replace(Some(Arc::clone(record)));
            }
            Snapshot::Graphics(record) => {
                self.graphics.send_replace(Some(Arc::clone(record)));
            }
            Snapshot::StaticInfo(record) => {
                self.static_info.send_replace(Some(Arc::clone(record)));
            }
        }

        if let Err(e) = self.events.try_send(snapshot) {
            match e {
                mpsc::error::TrySendError::Full(dropped) => {
                    debug!(region = %dropped.kind(), "Pipeline busy, dropping notification");
                }
                mpsc::error::TrySendError::Closed(_) => {
                    trace!("Pipeline closed, notification discarded");
                }
            }
        }
    }
}

/// Read one region on the blocking pool and decode it.
pub(crate) async fn poll_once(region: &Arc<dyn Region>, read_timeout: Duration) -> Result<Snapshot> {
    let kind = region.kind();
    let reader = Arc::clone(region);

    let read = tokio::task::spawn_blocking(move || reader.read());
    let raw = tokio::time::timeout(read_timeout, read)
        .await
        .map_err(|_| TelemetryError::Timeout { region: kind, duration: read_timeout })?
        .map_err(|e| TelemetryError::task_failed("region read", e))??;

    decode(&raw)
}

/// Why a poller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollerExit {
    Cancelled,
    /// Too many consecutive failures; the region is considered gone.
    Lost(RegionKind),
}

pub(crate) struct Poller {
    pub region: Arc<dyn Region>,
    pub period: Duration,
    pub read_timeout: Duration,
    pub max_consecutive_failures: u32,
    pub publisher: Arc<SnapshotPublisher>,
}

impl Poller {
    /// Poll on a fixed period until cancelled or the region is lost.
    ///
    /// The first tick is one period out; the connector performs the initial
    /// read itself. A read still in flight when `token` fires is abandoned
    /// and its result never published. Losing the region cancels `token`,
    /// which stops the sibling pollers of the same connection.
    pub async fn run(self, token: CancellationToken) -> PollerExit {
        let kind = self.region.kind();
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut failures = 0u32;

        debug!(region = %kind, period_ms = self.period.as_millis() as u64, "Poller started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(region = %kind, "Poller cancelled");
                    return PollerExit::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            let polled = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(region = %kind, "Poller cancelled during read");
                    return PollerExit::Cancelled;
                }
                polled = poll_once(&self.region, self.read_timeout) => polled,
            };

            match polled {
                Ok(snapshot) => {
                    failures = 0;
                    trace!(region = %kind, "Polled region");
                    self.publisher.publish(snapshot);
                }
                Err(e) => {
                    failures += 1;
                    debug!(region = %kind, failures, error = %e, "Skipped poll");

                    if failures >= self.max_consecutive_failures {
                        warn!(region = %kind, failures, "Region lost after repeated poll failures");
                        token.cancel();
                        return PollerExit::Lost(kind);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RegionProvider;
    use crate::test_utils::{ScriptedProvider, sample_graphics};

    fn publisher(
        capacity: usize,
    ) -> (Arc<SnapshotPublisher>, LatestSnapshots, mpsc::Receiver<Snapshot>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (publisher, latest) = SnapshotPublisher::new(tx);
        (Arc::new(publisher), latest, rx)
    }

    #[tokio::test]
    async fn poll_once_decodes_the_region_record() {
        let provider = ScriptedProvider::running();
        provider.publish(&sample_graphics());
        let region = provider.open(RegionKind::Graphics).unwrap();

        match poll_once(&region, Duration::from_millis(250)).await.unwrap() {
            Snapshot::Graphics(graphics) => assert_eq!(*graphics, sample_graphics()),
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn poll_once_reports_read_failures() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        provider.fail_reads(RegionKind::Physics, true);

        let err = poll_once(&region, Duration::from_millis(250)).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Decode { region: RegionKind::Physics, .. }));
    }

    #[tokio::test]
    async fn publish_updates_latest_and_drops_when_full() {
        let (publisher, latest, mut events) = publisher(1);
        let graphics = Arc::new(sample_graphics());

        publisher.publish(Snapshot::Graphics(Arc::clone(&graphics)));
        publisher.publish(Snapshot::Graphics(Arc::clone(&graphics)));

        assert_eq!(latest.graphics.borrow().as_deref(), Some(&*graphics));
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failures_mark_region_lost() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        provider.fail_reads(RegionKind::Physics, true);
        let (publisher, latest, _events) = publisher(8);

        let token = CancellationToken::new();
        let poller = Poller {
            region,
            period: Duration::from_millis(100),
            read_timeout: Duration::from_millis(50),
            max_consecutive_failures: 3,
            publisher,
        };

        let exit = poller.run(token.clone()).await;
        assert_eq!(exit, PollerExit::Lost(RegionKind::Physics));
        assert!(token.is_cancelled());
        assert_eq!(provider.reads(RegionKind::Physics), 3);
        assert!(latest.physics.borrow().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_the_failure_count() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        let (publisher, latest, _events) = publisher(8);
        let token = CancellationToken::new();

        let poller = Poller {
            region,
            period: Duration::from_millis(100),
            read_timeout: Duration::from_millis(50),
            max_consecutive_failures: 2,
            publisher,
        };
        let task = tokio::spawn(poller.run(token.clone()));

        provider.fail_reads(RegionKind::Physics, true);
        tokio::time::sleep(Duration::from_millis(150)).await;
        provider.fail_reads(RegionKind::Physics, false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        provider.fail_reads(RegionKind::Physics, true);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!token.is_cancelled());
        assert!(latest.physics.borrow().is_some());

        token.cancel();
        assert_eq!(task.await.unwrap(), PollerExit::Cancelled);
    }

    // Stalled reads block a pool thread, which holds the paused clock, so the
    // tests below run on real time with short periods.

    async fn wait_for_reads(provider: &ScriptedProvider, kind: RegionKind, reads: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while provider.reads(kind) < reads {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn poll_once_times_out_on_a_stalled_region() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        provider.stall_reads(RegionKind::Physics, Some(Duration::from_millis(300)));

        let err = poll_once(&region, Duration::from_millis(30)).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Timeout { region: RegionKind::Physics, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn timed_out_reads_count_toward_region_loss() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        provider.stall_reads(RegionKind::Physics, Some(Duration::from_millis(200)));
        let (publisher, latest, _events) = publisher(8);
        let token = CancellationToken::new();

        let poller = Poller {
            region,
            period: Duration::from_millis(20),
            read_timeout: Duration::from_millis(30),
            max_consecutive_failures: 2,
            publisher,
        };

        let exit = tokio::time::timeout(Duration::from_secs(5), poller.run(token.clone()))
            .await
            .unwrap();
        assert_eq!(exit, PollerExit::Lost(RegionKind::Physics));
        assert!(token.is_cancelled());
        assert_eq!(provider.reads(RegionKind::Physics), 2);
        assert!(latest.physics.borrow().is_none());
    }

    #[tokio::test]
    async fn next_tick_polls_after_a_timed_out_read() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        provider.stall_reads(RegionKind::Physics, Some(Duration::from_millis(100)));
        let (publisher, latest, _events) = publisher(8);
        let token = CancellationToken::new();

        let poller = Poller {
            region,
            period: Duration::from_millis(20),
            read_timeout: Duration::from_millis(30),
            max_consecutive_failures: 10,
            publisher,
        };
        let task = tokio::spawn(poller.run(token.clone()));

        wait_for_reads(&provider, RegionKind::Physics, 1).await;
        provider.stall_reads(RegionKind::Physics, None);

        let mut physics = latest.physics.clone();
        tokio::time::timeout(Duration::from_secs(5), physics.wait_for(|physics| physics.is_some()))
            .await
            .unwrap()
            .unwrap();
        assert!(provider.reads(RegionKind::Physics) >= 2);
        assert!(!token.is_cancelled());

        token.cancel();
        assert_eq!(task.await.unwrap(), PollerExit::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_poller_discards_its_read_in_flight() {
        let provider = ScriptedProvider::running();
        let region = provider.open(RegionKind::Physics).unwrap();
        provider.stall_reads(RegionKind::Physics, Some(Duration::from_millis(150)));
        let (publisher, latest, mut events) = publisher(8);
        let token = CancellationToken::new();

        let poller = Poller {
            region,
            period: Duration::from_millis(10),
            read_timeout: Duration::from_secs(2),
            max_consecutive_failures: 3,
            publisher,
        };
        let task = tokio::spawn(poller.run(token.clone()));

        wait_for_reads(&provider, RegionKind::Physics, 1).await;
        token.cancel();
        let exit = tokio::time::timeout(Duration::from_millis(100), task).await.unwrap().unwrap();
        assert_eq!(exit, PollerExit::Cancelled);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(latest.physics.borrow().is_none());
        assert!(events.try_recv().is_err());
        assert_eq!(provider.reads(RegionKind::Physics), 1);
    }
}

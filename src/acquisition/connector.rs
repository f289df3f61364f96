//! Region connector state machine
//!
//! ```text
//!            retry tick                 all three open
//! Disconnected ─────────> Connecting ───────────────────> Connected
//!      ^                      │                               │
//!      │   any region absent  │      a region lost, or stop   │
//!      └──────────────────────┴───────────────────────────────┘
//! ```
//!
//! The connector is the single writer of [`ConnectionState`]. Regions are
//! opened as a group: if any one is missing, the ones already opened are
//! dropped again and nothing is polled. Absence is the normal idle state and
//! is retried forever. Any other open failure is fatal and ends the task.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::poller::{Poller, PollerExit, SnapshotPublisher, poll_once};
use crate::Result;
use crate::config::PollIntervals;
use crate::provider::{Region, RegionProvider};
use crate::types::{ConnectionState, RegionKind};

/// Timing and failure limits of the connector and its pollers.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorSettings {
    pub retry_interval: Duration,
    pub read_timeout: Duration,
    pub intervals: PollIntervals,
    pub max_consecutive_failures: u32,
}

pub(crate) struct Connector {
    provider: Arc<dyn RegionProvider>,
    settings: ConnectorSettings,
    state: watch::Sender<ConnectionState>,
    publisher: Arc<SnapshotPublisher>,
}

impl Connector {
    pub fn new(
        provider: Arc<dyn RegionProvider>,
        settings: ConnectorSettings,
        state: watch::Sender<ConnectionState>,
        publisher: Arc<SnapshotPublisher>,
    ) -> Self {
        Self { provider, settings, state, publisher }
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current, to = %next, "Connection state changed");
            *current = next;
            true
        });
    }

    /// Run until `cancel` fires (`Ok`) or a fatal open error occurs (`Err`).
    ///
    /// The first attempt happens immediately, later ones on the retry interval.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut retry = interval(self.settings.retry_interval);
        retry.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut waiting_logged = false;

        info!(
            retry_ms = self.settings.retry_interval.as_millis() as u64,
            "Waiting for simulator shared memory"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = retry.tick() => {}
            }

            self.set_state(ConnectionState::Connecting);
            match self.open_all() {
                Ok(regions) => {
                    waiting_logged = false;
                    self.set_state(ConnectionState::Connected);
                    info!("Connected to simulator shared memory");

                    let end = self.run_connected(regions, &cancel).await;
                    self.set_state(ConnectionState::Disconnected);

                    match end {
                        ConnectionEnd::Lost => {
                            warn!("Connection lost, resuming retries");
                            retry.reset();
                        }
                        ConnectionEnd::Stopped => break,
                    }
                }
                Err(e) if e.is_absence() => {
                    self.set_state(ConnectionState::Disconnected);
                    if !waiting_logged {
                        info!(reason = %e, "Simulator not available yet");
                        waiting_logged = true;
                    } else {
                        debug!(reason = %e, "Simulator still not available");
                    }
                }
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    error!(error = %e, suggestions = ?e.recovery_suggestions(), "Fatal shared memory error");
                    return Err(e);
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Connector stopped");
        Ok(())
    }

    /// Open every region or none.
    fn open_all(&self) -> Result<Vec<Arc<dyn Region>>> {
        RegionKind::ALL.iter().map(|&kind| self.provider.open(kind)).collect()
    }

    /// Initial read of every region, then poll until a region is lost or `cancel` fires.
    async fn run_connected(
        &self,
        regions: Vec<Arc<dyn Region>>,
        cancel: &CancellationToken,
    ) -> ConnectionEnd {
        for region in &regions {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ConnectionEnd::Stopped,
                read = poll_once(region, self.settings.read_timeout) => read,
            };
            match read {
                Ok(snapshot) => self.publisher.publish(snapshot),
                Err(e) => debug!(region = %region.kind(), error = %e, "Initial read failed"),
            }
        }

        let connection = cancel.child_token();
        let mut pollers = PollerTasks::default();
        for region in regions {
            let kind = region.kind();
            let poller = Poller {
                period: self.settings.intervals.period(kind),
                region,
                read_timeout: self.settings.read_timeout,
                max_consecutive_failures: self.settings.max_consecutive_failures,
                publisher: Arc::clone(&self.publisher),
            };
            pollers.spawn(kind, poller.run(connection.clone()));
        }

        while let Some((region, exit)) = pollers.join_next().await {
            match exit {
                Ok(PollerExit::Lost(kind)) => debug!(region = %kind, "Poller reported region lost"),
                Ok(PollerExit::Cancelled) => {}
                Err(e) => {
                    warn!(region = ?region, error = %e, "Poller task failed");
                    connection.cancel();
                }
            }
        }

        if cancel.is_cancelled() { ConnectionEnd::Stopped } else { ConnectionEnd::Lost }
    }
}

/// Why a connected period ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    Stopped,
    Lost,
}

/// Poller tasks of one connection, keyed by task id so a failed task can
/// still be attributed to its region.
#[derive(Default)]
struct PollerTasks {
    tasks: JoinSet<PollerExit>,
    regions: HashMap<task::Id, RegionKind>,
}

impl PollerTasks {
    fn spawn<F>(&mut self, region: RegionKind, poller: F)
    where
        F: Future<Output = PollerExit> + Send + 'static,
    {
        let handle = self.tasks.spawn(poller);
        self.regions.insert(handle.id(), region);
    }

    async fn join_next(&mut self) -> Option<(Option<RegionKind>, Result<PollerExit, JoinError>)> {
        let joined = self.tasks.join_next_with_id().await?;
        let id = match &joined {
            Ok((id, _)) => *id,
            Err(e) => e.id(),
        };
        let region = self.regions.remove(&id);
        Some((region, joined.map(|(_, exit)| exit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_poller_task_is_attributed_to_its_region() {
        let mut pollers = PollerTasks::default();
        pollers.spawn(RegionKind::Graphics, async { panic!("poller crashed") });

        let (region, exit) = pollers.join_next().await.unwrap();
        assert_eq!(region, Some(RegionKind::Graphics));
        assert!(exit.unwrap_err().is_panic());
        assert!(pollers.join_next().await.is_none());
    }

    #[tokio::test]
    async fn finished_pollers_report_their_exit() {
        let mut pollers = PollerTasks::default();
        pollers.spawn(RegionKind::StaticInfo, async { PollerExit::Lost(RegionKind::StaticInfo) });

        let (region, exit) = pollers.join_next().await.unwrap();
        assert_eq!(region, Some(RegionKind::StaticInfo));
        assert_eq!(exit.unwrap(), PollerExit::Lost(RegionKind::StaticInfo));
        assert!(pollers.regions.is_empty());
    }
}

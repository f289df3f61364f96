//! Relay entry point
//!
//! [`Relay::start`] wires the connector, pollers and pipeline together and
//! returns a [`RelayHandle`] for observing and stopping them.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::acquisition::{Connector, ConnectorSettings, LatestSnapshots, SnapshotPublisher};
use crate::config::RelayConfig;
use crate::derivation::DerivationEngine;
use crate::emitter::Emitter;
use crate::pipeline::Pipeline;
use crate::provider::RegionProvider;
use crate::providers::SharedMemoryProvider;
use crate::session::{GameStatusChange, SessionState};
use crate::transport::{SnapshotSink, UdpSink};
use crate::types::{ConnectionState, GraphicsRecord, PhysicsRecord, StaticInfoRecord};
use crate::{Result, TelemetryError};

/// Capacity of the poller to pipeline queue.
const EVENT_QUEUE_CAPACITY: usize = 64;

/// Builder for a running relay.
pub struct Relay;

impl Relay {
    /// Start relaying from `provider` to `sink`.
    ///
    /// Returns immediately; the connector keeps retrying in the background
    /// until the simulator appears.
    pub fn start<P>(config: RelayConfig, provider: P, sink: Arc<dyn SnapshotSink>) -> Result<RelayHandle>
    where
        P: RegionProvider,
    {
        config
            .validate()
            .map_err(|details| TelemetryError::config_error("<runtime>", details))?;

        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (publisher, latest) = SnapshotPublisher::new(events_tx);
        let (connection_tx, connection) = watch::channel(ConnectionState::Disconnected);
        let (session_tx, session) = watch::channel(SessionState::default());
        let (status_tx, status) = watch::channel(None);

        let settings = ConnectorSettings {
            retry_interval: config.retry_interval(),
            read_timeout: config.read_timeout(),
            intervals: config.intervals,
            max_consecutive_failures: config.max_consecutive_poll_failures,
        };
        info!(sink = %sink.target(), "Starting telemetry relay");

        let emitter = Emitter::new(
            config.emit_interval(),
            DerivationEngine::new(config.derivation),
            sink,
        );
        let pipeline = Pipeline::new(emitter, session_tx, status_tx);
        let pipeline = tokio::spawn(pipeline.run(events_rx, cancel.clone()));

        let connector =
            Connector::new(Arc::new(provider), settings, connection_tx, Arc::new(publisher));
        let connector_cancel = cancel.clone();
        let connector = tokio::spawn(async move {
            let result = connector.run(connector_cancel.clone()).await;
            if result.is_err() {
                connector_cancel.cancel();
            }
            result
        });

        Ok(RelayHandle {
            connection,
            session,
            status,
            latest,
            cancel,
            connector: Some(connector),
            pipeline: Some(pipeline),
        })
    }

    /// Start relaying from the simulator's shared memory over UDP.
    pub async fn connect_shared_memory(config: RelayConfig) -> Result<RelayHandle> {
        let sink = UdpSink::bind(&config.sink).await?;
        Self::start(config, SharedMemoryProvider, Arc::new(sink))
    }
}

/// Handle to a running relay.
///
/// Dropping the handle stops the relay.
pub struct RelayHandle {
    connection: watch::Receiver<ConnectionState>,
    session: watch::Receiver<SessionState>,
    status: watch::Receiver<Option<GameStatusChange>>,
    latest: LatestSnapshots,
    cancel: CancellationToken,
    connector: Option<JoinHandle<Result<()>>>,
    pipeline: Option<JoinHandle<()>>,
}

impl RelayHandle {
    pub fn is_connected(&self) -> bool {
        self.connection.borrow().is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Receiver that observes every connection state change.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    pub fn session(&self) -> SessionState {
        *self.session.borrow()
    }

    /// Game status changes, starting with the most recent one if any.
    pub fn status_updates(&self) -> impl Stream<Item = GameStatusChange> + use<> {
        WatchStream::new(self.status.clone()).filter_map(|change| async move { change })
    }

    pub fn latest_physics(&self) -> Option<Arc<PhysicsRecord>> {
        self.latest.physics.borrow().clone()
    }

    pub fn latest_graphics(&self) -> Option<Arc<GraphicsRecord>> {
        self.latest.graphics.borrow().clone()
    }

    pub fn latest_static_info(&self) -> Option<Arc<StaticInfoRecord>> {
        self.latest.static_info.borrow().clone()
    }

    /// Request shutdown. Use [`join`](Self::join) to wait for it.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Resolves once shutdown was requested or a fatal error stopped the relay.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }

    /// Wait for the relay tasks to finish.
    ///
    /// Returns the connector's fatal error, if it stopped because of one.
    pub async fn join(mut self) -> Result<()> {
        let connector = self.connector.take();
        let pipeline = self.pipeline.take();

        let result = match connector {
            Some(task) => task.await.map_err(|e| TelemetryError::task_failed("connector", e))?,
            None => Ok(()),
        };
        self.cancel.cancel();
        if let Some(task) = pipeline {
            task.await.map_err(|e| TelemetryError::task_failed("pipeline", e))?;
        }
        result
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        debug!("Dropping relay handle");
        self.cancel.cancel();
    }
}

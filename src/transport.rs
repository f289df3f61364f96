//! Snapshot delivery to the telemetry sink

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::config::SinkConfig;
use crate::{Result, TelemetryError};

/// Destination for serialized snapshots.
///
/// Delivery is best effort. Implementations report failures through the
/// returned error and never retry.
#[async_trait::async_trait]
pub trait SnapshotSink: Send + Sync + 'static {
    async fn send(&self, payload: &[u8]) -> Result<()>;

    /// Human readable destination, for logs.
    fn target(&self) -> String;
}

/// Sends one UDP datagram per snapshot.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    target: String,
}

impl UdpSink {
    /// Bind an ephemeral local socket for sending to `config`'s host and port.
    pub async fn bind(config: &SinkConfig) -> Result<Self> {
        let target = config.target();
        let local: SocketAddr = ([0, 0, 0, 0], 0).into();
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| TelemetryError::Transport { target: target.clone(), source })?;

        debug!(target = %target, "UDP sink ready");
        Ok(Self { socket, target })
    }
}

#[async_trait::async_trait]
impl SnapshotSink for UdpSink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        let sent = self
            .socket
            .send_to(payload, self.target.as_str())
            .await
            .map_err(|source| TelemetryError::Transport { target: self.target.clone(), source })?;
        trace!(target = %self.target, bytes = sent, "Snapshot sent");
        Ok(())
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}

//! Shared memory acquisition
//!
//! The [`connector`] owns the connection lifecycle and spawns one
//! [`poller`] per region while connected. Pollers publish decoded snapshots
//! into latest-value channels and onto the pipeline queue.

pub(crate) mod connector;
pub(crate) mod poller;

pub use connector::ConnectorSettings;
pub(crate) use connector::Connector;
pub(crate) use poller::{LatestSnapshots, SnapshotPublisher};

#[cfg(test)]
mod tests;

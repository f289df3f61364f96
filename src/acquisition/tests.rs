use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::PollIntervals;
use crate::decoder::Snapshot;
use crate::test_utils::{
    Availability, ScriptedProvider, sample_graphics, sample_physics, sample_static_info, settle,
};
use crate::types::{ConnectionState, RegionKind};
use crate::{Result, TelemetryError};

fn settings() -> ConnectorSettings {
    ConnectorSettings {
        retry_interval: Duration::from_secs(2),
        read_timeout: Duration::from_millis(50),
        intervals: PollIntervals { physics_ms: 100, graphics_ms: 200, static_info_ms: 1000 },
        max_consecutive_failures: 3,
    }
}

struct Running {
    state: watch::Receiver<ConnectionState>,
    latest: LatestSnapshots,
    _events: mpsc::Receiver<Snapshot>,
    cancel: CancellationToken,
    task: JoinHandle<Result<()>>,
}

fn spawn_connector(provider: &ScriptedProvider) -> Running {
    spawn_connector_with(provider, settings())
}

fn spawn_connector_with(provider: &ScriptedProvider, settings: ConnectorSettings) -> Running {
    let (events_tx, events) = mpsc::channel(64);
    let (publisher, latest) = SnapshotPublisher::new(events_tx);
    let (state_tx, state) = watch::channel(ConnectionState::Disconnected);
    let cancel = CancellationToken::new();

    let connector =
        Connector::new(Arc::new(provider.clone()), settings, state_tx, Arc::new(publisher));
    let task = tokio::spawn(connector.run(cancel.clone()));

    Running { state, latest, _events: events, cancel, task }
}

fn total_reads(provider: &ScriptedProvider) -> usize {
    RegionKind::ALL.iter().map(|&kind| provider.reads(kind)).sum()
}

#[tokio::test(start_paused = true)]
async fn first_attempt_is_immediate() {
    let provider = ScriptedProvider::new();
    let running = spawn_connector(&provider);
    settle().await;

    assert_eq!(provider.open_attempts(RegionKind::StaticInfo), 1);
    assert_eq!(*running.state.borrow(), ConnectionState::Disconnected);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(provider.open_attempts(RegionKind::StaticInfo), 2);
    running.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn partial_regions_are_never_polled() {
    let provider = ScriptedProvider::new();
    provider.set_availability(RegionKind::StaticInfo, Availability::Present);
    provider.set_availability(RegionKind::Graphics, Availability::Present);

    let running = spawn_connector(&provider);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(provider.open_attempts(RegionKind::Physics) >= 5);
    assert_eq!(total_reads(&provider), 0);
    assert_eq!(*running.state.borrow(), ConnectionState::Disconnected);
    assert!(running.latest.graphics.borrow().is_none());
    running.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn connects_and_reads_every_region_immediately() {
    let provider = ScriptedProvider::new();
    provider.publish(&sample_static_info());
    provider.publish(&sample_graphics());
    provider.publish(&sample_physics());

    let mut running = spawn_connector(&provider);
    settle().await;
    provider.set_running(true);

    running.state.wait_for(|state| state.is_connected()).await.unwrap();
    let mut static_info = running.latest.static_info.clone();
    static_info.wait_for(|info| info.is_some()).await.unwrap();
    let mut physics = running.latest.physics.clone();
    physics.wait_for(|physics| physics.is_some()).await.unwrap();

    assert_eq!(running.latest.graphics.borrow().as_deref(), Some(&sample_graphics()));
    assert_eq!(running.latest.physics.borrow().as_deref(), Some(&sample_physics()));
    assert!(provider.reads(RegionKind::StaticInfo) >= 1);

    running.cancel.cancel();
    running.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn lost_region_drops_connection_and_retries() {
    let provider = ScriptedProvider::running();
    let mut running = spawn_connector(&provider);
    running.state.wait_for(|state| state.is_connected()).await.unwrap();

    provider.set_running(false);
    provider.fail_reads(RegionKind::Physics, true);
    running.state.wait_for(|state| *state == ConnectionState::Disconnected).await.unwrap();

    let reads_after_loss = total_reads(&provider);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(total_reads(&provider), reads_after_loss);

    provider.fail_reads(RegionKind::Physics, false);
    provider.set_running(true);
    running.state.wait_for(|state| state.is_connected()).await.unwrap();
    assert!(provider.open_attempts(RegionKind::StaticInfo) >= 2);

    running.cancel.cancel();
    running.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn denied_access_is_fatal() {
    let provider = ScriptedProvider::running();
    provider.set_availability(RegionKind::Graphics, Availability::Denied);
    let running = spawn_connector(&provider);

    let err = running.task.await.unwrap().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, TelemetryError::RegionAccess { region: RegionKind::Graphics, .. }));
    assert_eq!(*running.state.borrow(), ConnectionState::Disconnected);
    assert_eq!(total_reads(&provider), 0);
}

#[tokio::test(start_paused = true)]
async fn undersized_region_is_fatal() {
    let provider = ScriptedProvider::running();
    provider.set_availability(RegionKind::Physics, Availability::TooSmall);
    let running = spawn_connector(&provider);

    let err = running.task.await.unwrap().unwrap_err();
    assert!(matches!(err, TelemetryError::Layout { region: RegionKind::Physics, .. }));
}

#[tokio::test(start_paused = true)]
async fn stop_halts_all_reads() {
    let provider = ScriptedProvider::running();
    let mut running = spawn_connector(&provider);
    running.state.wait_for(|state| state.is_connected()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    running.cancel.cancel();
    running.task.await.unwrap().unwrap();
    assert_eq!(*running.state.borrow(), ConnectionState::Disconnected);

    let reads = total_reads(&provider);
    assert!(reads > 3);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(total_reads(&provider), reads);
}

// A stalled read blocks a pool thread and with it the paused clock.
#[tokio::test]
async fn stop_discards_initial_read_in_flight() {
    let provider = ScriptedProvider::running();
    for kind in RegionKind::ALL {
        provider.stall_reads(kind, Some(Duration::from_millis(150)));
    }
    let settings = ConnectorSettings { read_timeout: Duration::from_secs(2), ..settings() };
    let running = spawn_connector_with(&provider, settings);

    tokio::time::timeout(Duration::from_secs(5), async {
        while provider.reads(RegionKind::StaticInfo) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    running.cancel.cancel();
    tokio::time::timeout(Duration::from_millis(100), running.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(*running.state.borrow(), ConnectionState::Disconnected);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(running.latest.static_info.borrow().is_none());
    assert_eq!(total_reads(&provider), 1);
}

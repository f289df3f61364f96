//! Snapshot pipeline
//!
//! A single task consumes decoded snapshots in arrival order. Graphics
//! snapshots drive the [`SessionTracker`], physics snapshots drive the
//! [`Emitter`]. Keeping both on one task means the derivation state and the
//! session state never need a lock.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::decoder::Snapshot;
use crate::emitter::{EmitContext, EmitOutcome, Emitter};
use crate::session::{GameStatusChange, SessionState, SessionTracker};
use crate::types::{GraphicsRecord, StaticInfoRecord};

pub(crate) struct Pipeline {
    tracker: SessionTracker,
    emitter: Emitter,
    graphics: Option<Arc<GraphicsRecord>>,
    static_info: Option<Arc<StaticInfoRecord>>,
    session: watch::Sender<SessionState>,
    status: watch::Sender<Option<GameStatusChange>>,
}

impl Pipeline {
    pub fn new(
        emitter: Emitter,
        session: watch::Sender<SessionState>,
        status: watch::Sender<Option<GameStatusChange>>,
    ) -> Self {
        Self {
            tracker: SessionTracker::new(),
            emitter,
            graphics: None,
            static_info: None,
            session,
            status,
        }
    }

    pub async fn run(mut self, mut events: mpsc::Receiver<Snapshot>, cancel: CancellationToken) {
        debug!("Pipeline started");
        loop {
            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = events.recv() => match next {
                    Some(snapshot) => snapshot,
                    None => break,
                },
            };
            self.handle(snapshot, Instant::now());
        }
        debug!("Pipeline stopped");
    }

    fn handle(&mut self, snapshot: Snapshot, now: Instant) {
        match snapshot {
            Snapshot::StaticInfo(info) => {
                trace!(track = %info.track, car = %info.car_model, "Static info updated");
                self.static_info = Some(info);
            }
            Snapshot::Graphics(graphics) => {
                let status = graphics.game_status();
                self.graphics = Some(graphics);

                if let Some(change) = self.tracker.observe(status) {
                    self.session.send_replace(change.session);
                    self.status.send_replace(Some(change));
                }
            }
            Snapshot::Physics(physics) => {
                let ctx = EmitContext {
                    physics: &physics,
                    graphics: self.graphics.as_deref(),
                    static_info: self.static_info.as_deref(),
                    session: self.tracker.state(),
                };
                match self.emitter.on_physics(now, ctx) {
                    Ok(EmitOutcome::Emitted(_)) => trace!("Snapshot emitted"),
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Could not build snapshot"),
                }
            }
        }
    }
}

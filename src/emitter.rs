//! Throttled snapshot emission
//!
//! Every physics snapshot is offered to the [`Emitter`]. It checks, in order,
//! that a session is active, that graphics and static info have both been
//! seen, and that the minimum interval has elapsed since the last emission.
//! The first failing check ends the call without touching any state. Only
//! when all pass is the derivation run and the result handed to the sink.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::Result;
use crate::derivation::{DerivationEngine, DerivationInput};
use crate::session::SessionState;
use crate::transport::SnapshotSink;
use crate::types::{GraphicsRecord, PhysicsRecord, StaticInfoRecord, TelemetrySnapshot};

/// What happened to one offered physics snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitOutcome {
    SessionInactive,
    /// Graphics or static info has not been received yet.
    AwaitingSnapshots,
    Throttled,
    Emitted(Arc<TelemetrySnapshot>),
}

impl EmitOutcome {
    pub fn is_emitted(&self) -> bool {
        matches!(self, EmitOutcome::Emitted(_))
    }
}

/// Latest inputs available to the emitter on a physics tick.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub physics: &'a PhysicsRecord,
    pub graphics: Option<&'a GraphicsRecord>,
    pub static_info: Option<&'a StaticInfoRecord>,
    pub session: SessionState,
}

pub struct Emitter {
    min_interval: Duration,
    last_emit: Option<Instant>,
    engine: DerivationEngine,
    sink: Arc<dyn SnapshotSink>,
}

impl Emitter {
    pub fn new(min_interval: Duration, engine: DerivationEngine, sink: Arc<dyn SnapshotSink>) -> Self {
        Self { min_interval, last_emit: None, engine, sink }
    }

    pub fn engine(&self) -> &DerivationEngine {
        &self.engine
    }

    /// Offer a physics snapshot observed at `now`.
    ///
    /// On success the serialized snapshot is delivered on a detached task, so
    /// a slow or failing sink never delays the next tick.
    pub fn on_physics(&mut self, now: Instant, ctx: EmitContext<'_>) -> Result<EmitOutcome> {
        if !ctx.session.active {
            trace!("Session inactive, not emitting");
            return Ok(EmitOutcome::SessionInactive);
        }

        let (Some(graphics), Some(static_info)) = (ctx.graphics, ctx.static_info) else {
            debug!(
                has_graphics = ctx.graphics.is_some(),
                has_static_info = ctx.static_info.is_some(),
                "Waiting for first graphics and static info snapshots"
            );
            return Ok(EmitOutcome::AwaitingSnapshots);
        };

        if let Some(last) = self.last_emit {
            if now.saturating_duration_since(last) < self.min_interval {
                trace!("Emission throttled");
                return Ok(EmitOutcome::Throttled);
            }
        }

        let snapshot = self.engine.derive(DerivationInput {
            physics: ctx.physics,
            graphics: Some(graphics),
            static_info: Some(static_info),
            session: ctx.session,
            timestamp: Utc::now(),
        });
        let payload = snapshot.to_json_bytes()?;
        self.last_emit = Some(now);

        debug!(
            session_id = snapshot.session.session_id,
            distance = snapshot.metrics.distance_total,
            fuel_used = snapshot.metrics.fuel_used_total,
            bytes = payload.len(),
            "Emitting snapshot"
        );

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.send(&payload).await {
                warn!(target = %sink.target(), error = %e, "Snapshot delivery failed");
            }
        });

        Ok(EmitOutcome::Emitted(Arc::new(snapshot)))
    }
}

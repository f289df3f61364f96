//! Session lifecycle tracking from the graphics game status
//!
//! A session starts whenever the observed status enters `Live` and ends when it
//! leaves it. Every start mints a fresh identifier from wall-clock
//! milliseconds, strictly greater than any identifier minted before it, so a
//! quick `Live -> Pause -> Live` within the same millisecond still yields two
//! distinct sessions.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::AcStatus;

/// Current session identity as seen by the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub active: bool,
    /// Identifier of the current or most recent session.
    pub session_id: Option<i64>,
    pub game_status: AcStatus,
}

/// Published on every change of the observed game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatusChange {
    pub previous: AcStatus,
    pub current: AcStatus,
    pub session: SessionState,
}

impl GameStatusChange {
    pub fn started_session(&self) -> bool {
        self.current.is_live()
    }
}

/// Mints monotonically increasing identifiers from millisecond timestamps.
#[derive(Debug, Clone, Default)]
pub struct SessionIdGenerator {
    last: Option<i64>,
}

impl SessionIdGenerator {
    pub fn next_at(&mut self, now_ms: i64) -> i64 {
        let id = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(id);
        id
    }
}

/// State machine over observed game status values.
#[derive(Debug, Default)]
pub struct SessionTracker {
    state: SessionState,
    ids: SessionIdGenerator,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Feed the status from a graphics snapshot, using the current wall clock.
    pub fn observe(&mut self, status: AcStatus) -> Option<GameStatusChange> {
        self.observe_at(status, Utc::now().timestamp_millis())
    }

    /// Feed a status observed at `now_ms` (Unix milliseconds).
    ///
    /// Returns `None` when the status did not change.
    pub fn observe_at(&mut self, status: AcStatus, now_ms: i64) -> Option<GameStatusChange> {
        let previous = self.state.game_status;
        if status == previous {
            return None;
        }

        self.state.game_status = status;
        if status.is_live() {
            let id = self.ids.next_at(now_ms);
            self.state.session_id = Some(id);
            self.state.active = true;
            info!(session_id = id, from = %previous, "Session started");
        } else {
            if self.state.active {
                info!(session_id = ?self.state.session_id, status = %status, "Session ended");
            } else {
                debug!(from = %previous, to = %status, "Game status changed");
            }
            self.state.active = false;
        }

        Some(GameStatusChange { previous, current: status, session: self.state })
    }
}

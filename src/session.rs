//! Process-wide relay state: who the assistant is and how far the feed has been acknowledged.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Assistant identity used in replies and the AI system prompt.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub assistant_name: String,
    pub creator_name: String,
}

/// Shared session.
///
/// `last_update_id` has a single writer (the ingestor). Everyone else reads
/// it through [`Session::snapshot`] or [`Session::last_update_id`].
#[derive(Debug)]
pub struct Session {
    identity: Identity,
    last_update_id: AtomicI64,
    started_at: DateTime<Utc>,
}

/// Read-only copy of the session for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub assistant_name: String,
    pub creator_name: String,
    pub last_update_id: i64,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session. The offset starts at 0; nothing survives a restart.
    pub fn new(identity: Identity) -> Self {
        Self::resume(identity, 0)
    }

    /// Session that continues from an already acknowledged update id.
    pub fn resume(identity: Identity, last_update_id: i64) -> Self {
        Self {
            identity,
            last_update_id: AtomicI64::new(last_update_id),
            started_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn last_update_id(&self) -> i64 {
        self.last_update_id.load(Ordering::Acquire)
    }

    /// Offset for the next poll: last acknowledged id + 1.
    pub fn next_offset(&self) -> i64 {
        self.last_update_id() + 1
    }

    /// Acknowledge everything up to `update_id`. Never moves backwards.
    pub(crate) fn acknowledge(&self, update_id: i64) -> i64 {
        let previous = self.last_update_id.fetch_max(update_id, Ordering::AcqRel);
        previous.max(update_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            assistant_name: self.identity.assistant_name.clone(),
            creator_name: self.identity.creator_name.clone(),
            last_update_id: self.last_update_id(),
            started_at: self.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            assistant_name: "ATLAS".to_string(),
            creator_name: "K.V.SARVESH".to_string(),
        }
    }

    #[test]
    fn test_new_session_starts_at_zero() {
        let session = Session::new(identity());
        assert_eq!(session.last_update_id(), 0);
        assert_eq!(session.next_offset(), 1);
    }

    #[test]
    fn test_acknowledge_is_monotonic() {
        let session = Session::new(identity());
        assert_eq!(session.acknowledge(10), 10);
        assert_eq!(session.acknowledge(7), 10);
        assert_eq!(session.last_update_id(), 10);
        assert_eq!(session.next_offset(), 11);
    }

    #[test]
    fn test_snapshot_copies_state() {
        let session = Session::resume(identity(), 42);
        let snap = session.snapshot();
        assert_eq!(snap.assistant_name, "ATLAS");
        assert_eq!(snap.creator_name, "K.V.SARVESH");
        assert_eq!(snap.last_update_id, 42);
    }
}

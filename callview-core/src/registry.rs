//! Participant registry
//!
//! Maintains the authoritative, versioned view of the call derived from the
//! inbound event stream. Each applied event produces a fresh immutable
//! `CallSnapshot`; readers never observe a half-applied event.

use crate::event::CallEvent;
use crate::participant::Participant;
use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Immutable view of the call at one version
///
/// Cheap to clone: participants and the remote map are shared behind `Arc`s,
/// and every mutation builds a new map rather than aliasing a previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    /// Monotonic counter, +1 per applied event of any kind
    pub version: u64,
    pub local: Option<Arc<Participant>>,
    pub remote: Arc<BTreeMap<ParticipantId, Arc<Participant>>>,
    pub active_speaker: Option<ParticipantId>,
}

impl CallSnapshot {
    /// Remote participant by id
    #[must_use]
    pub fn remote_participant(&self, id: &ParticipantId) -> Option<&Arc<Participant>> {
        self.remote.get(id)
    }

    /// The active speaker, only if it refers to a remote participant
    #[must_use]
    pub fn remote_active_speaker(&self) -> Option<&Arc<Participant>> {
        self.active_speaker
            .as_ref()
            .and_then(|id| self.remote.get(id))
    }
}

/// Authoritative call state, mutated one event at a time
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    local: Option<Arc<Participant>>,
    remote: BTreeMap<ParticipantId, Arc<Participant>>,
    active_speaker: Option<ParticipantId>,
    version: u64,
}

impl ParticipantRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the resulting snapshot
    ///
    /// An update for an unknown remote id is treated as a join, and a leave
    /// for an unknown id is a no-op; the call service may re-deliver either.
    /// The version advances by exactly 1 per call regardless of variant, so
    /// snapshots are totally ordered for staleness checks.
    pub fn apply_event(&mut self, event: CallEvent) -> CallSnapshot {
        match event {
            CallEvent::LocalUpdated(participant) => {
                debug!(participant_id = %participant.id, "local participant updated");
                self.local = Some(Arc::new(participant));
            }
            CallEvent::RemoteJoined(participant) | CallEvent::RemoteUpdated(participant) => {
                let id = participant.id.clone();
                let replaced = self
                    .remote
                    .insert(id.clone(), Arc::new(participant))
                    .is_some();
                debug!(participant_id = %id, replaced, "remote participant stored");
            }
            CallEvent::RemoteLeft(id) => {
                if self.remote.remove(&id).is_some() {
                    debug!(participant_id = %id, "remote participant left");
                } else {
                    // Duplicate leave; not an error.
                    debug!(participant_id = %id, "leave for unknown participant ignored");
                }
            }
            CallEvent::ActiveSpeakerChanged(id) => {
                debug!(active_speaker = ?id, "active speaker changed");
                self.active_speaker = id;
            }
        }

        self.version += 1;
        self.snapshot()
    }

    /// Current snapshot without applying an event
    #[must_use]
    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            version: self.version,
            local: self.local.clone(),
            remote: Arc::new(self.remote.clone()),
            active_speaker: self.active_speaker.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str) -> Participant {
        Participant::new(ParticipantId::from(id), false)
    }

    #[test]
    fn version_advances_by_one_per_event_of_any_kind() {
        let mut registry = ParticipantRegistry::new();

        let s1 = registry.apply_event(CallEvent::RemoteJoined(remote("a")));
        assert_eq!(s1.version, 1);

        let s2 = registry.apply_event(CallEvent::ActiveSpeakerChanged(None));
        assert_eq!(s2.version, 2);

        // A no-op leave still produces a new version.
        let s3 = registry.apply_event(CallEvent::RemoteLeft(ParticipantId::from("ghost")));
        assert_eq!(s3.version, 3);
    }

    #[test]
    fn update_for_unknown_participant_joins() {
        let mut registry = ParticipantRegistry::new();

        let snapshot = registry.apply_event(CallEvent::RemoteUpdated(remote("a")));
        assert!(snapshot
            .remote_participant(&ParticipantId::from("a"))
            .is_some());
    }

    #[test]
    fn update_replaces_wholesale() {
        let mut registry = ParticipantRegistry::new();

        registry.apply_event(CallEvent::RemoteJoined(
            remote("a").with_display_name("Alice"),
        ));
        let snapshot = registry.apply_event(CallEvent::RemoteUpdated(remote("a")));

        let participant = snapshot
            .remote_participant(&ParticipantId::from("a"))
            .expect("participant present");
        // The earlier display name does not survive a replace.
        assert_eq!(participant.display_name, None);
    }

    #[test]
    fn leave_removes_participant() {
        let mut registry = ParticipantRegistry::new();

        registry.apply_event(CallEvent::RemoteJoined(remote("a")));
        let snapshot = registry.apply_event(CallEvent::RemoteLeft(ParticipantId::from("a")));

        assert!(snapshot.remote.is_empty());
    }

    #[test]
    fn earlier_snapshots_are_unaffected_by_later_events() {
        let mut registry = ParticipantRegistry::new();

        let s1 = registry.apply_event(CallEvent::RemoteJoined(remote("a")));
        registry.apply_event(CallEvent::RemoteLeft(ParticipantId::from("a")));

        assert!(s1.remote_participant(&ParticipantId::from("a")).is_some());
    }

    #[test]
    fn local_participant_is_stored_separately() {
        let mut registry = ParticipantRegistry::new();

        let snapshot = registry.apply_event(CallEvent::LocalUpdated(Participant::new(
            ParticipantId::from("me"),
            true,
        )));

        assert!(snapshot.local.is_some());
        assert!(snapshot.remote.is_empty());
    }

    #[test]
    fn remote_active_speaker_ignores_local_and_unknown_ids() {
        let mut registry = ParticipantRegistry::new();

        registry.apply_event(CallEvent::LocalUpdated(Participant::new(
            ParticipantId::from("me"),
            true,
        )));
        registry.apply_event(CallEvent::RemoteJoined(remote("a")));

        let snapshot =
            registry.apply_event(CallEvent::ActiveSpeakerChanged(Some(ParticipantId::from(
                "me",
            ))));
        assert!(snapshot.remote_active_speaker().is_none());

        let snapshot = registry.apply_event(CallEvent::ActiveSpeakerChanged(Some(
            ParticipantId::from("a"),
        )));
        assert!(snapshot.remote_active_speaker().is_some());
    }
}

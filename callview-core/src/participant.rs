//! Participant value type and media track accessors

use crate::types::{MediaTrackRef, ParticipantId, TrackKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A participant in the call, local or remote
///
/// Replaced wholesale on every update event; never patched in place. A track
/// kind present in `tracks` with a `None` ref is announced but not currently
/// playable (for custom tracks this is the pre-subscription state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub is_local: bool,
    pub display_name: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub tracks: BTreeMap<TrackKind, Option<MediaTrackRef>>,
}

impl Participant {
    #[must_use]
    pub fn new(id: ParticipantId, is_local: bool) -> Self {
        Self {
            id,
            is_local,
            display_name: None,
            joined_at: Utc::now(),
            tracks: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Announce a track kind with a playable ref
    #[must_use]
    pub fn with_track(mut self, kind: TrackKind, track: MediaTrackRef) -> Self {
        self.tracks.insert(kind, Some(track));
        self
    }

    /// Announce a track kind without a playable ref yet
    #[must_use]
    pub fn with_announced_track(mut self, kind: TrackKind) -> Self {
        self.tracks.insert(kind, None);
        self
    }

    /// Playable ref for a track kind, if any
    #[must_use]
    pub fn playable_track(&self, kind: &TrackKind) -> Option<&MediaTrackRef> {
        self.tracks.get(kind).and_then(Option::as_ref)
    }

    /// Whether a playable screen-share track is currently exposed
    #[must_use]
    pub fn has_playable_screen(&self) -> bool {
        self.playable_track(&TrackKind::Screen).is_some()
    }

    /// First announced custom track name, in deterministic (name) order
    ///
    /// Custom tracks are selection candidates as soon as they are announced,
    /// before any subscription exists for them.
    #[must_use]
    pub fn first_custom_track_name(&self) -> Option<&str> {
        self.tracks.keys().find_map(|kind| match kind {
            TrackKind::Custom(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announced_custom_track_is_reported_without_playable_ref() {
        let participant = Participant::new(ParticipantId::from("p1"), false)
            .with_announced_track(TrackKind::Custom("cam2".to_string()));

        assert_eq!(participant.first_custom_track_name(), Some("cam2"));
        assert!(participant
            .playable_track(&TrackKind::Custom("cam2".to_string()))
            .is_none());
    }

    #[test]
    fn custom_track_names_resolve_in_name_order() {
        let participant = Participant::new(ParticipantId::from("p1"), false)
            .with_announced_track(TrackKind::Custom("zebra".to_string()))
            .with_announced_track(TrackKind::Custom("alpha".to_string()));

        assert_eq!(participant.first_custom_track_name(), Some("alpha"));
    }

    #[test]
    fn screen_share_requires_playable_ref() {
        let announced = Participant::new(ParticipantId::from("p1"), false)
            .with_announced_track(TrackKind::Screen);
        assert!(!announced.has_playable_screen());

        let playable = Participant::new(ParticipantId::from("p1"), false)
            .with_track(TrackKind::Screen, MediaTrackRef::from("screen-1"));
        assert!(playable.has_playable_screen());
    }
}

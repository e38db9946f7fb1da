//! Inbound call events
//!
//! The call service's per-callback delegate surface is collapsed into a single
//! tagged union consumed by one `apply_event` entry point, so event ordering
//! can be reasoned about (and tested) in one place.

use crate::participant::Participant;
use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};

/// One state change in the call, delivered in real-time order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    /// The local participant's state was replaced
    LocalUpdated(Participant),
    /// A remote participant joined the call
    RemoteJoined(Participant),
    /// A remote participant's state was replaced
    RemoteUpdated(Participant),
    /// A remote participant left the call
    RemoteLeft(ParticipantId),
    /// The active speaker changed (`None` clears it)
    ActiveSpeakerChanged(Option<ParticipantId>),
}

impl CallEvent {
    /// Short name for structured logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LocalUpdated(_) => "local_updated",
            Self::RemoteJoined(_) => "remote_joined",
            Self::RemoteUpdated(_) => "remote_updated",
            Self::RemoteLeft(_) => "remote_left",
            Self::ActiveSpeakerChanged(_) => "active_speaker_changed",
        }
    }
}

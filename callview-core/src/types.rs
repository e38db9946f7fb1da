//! Common types used throughout the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a call participant
///
/// Opaque and stable for the participant's lifetime in the call. Ordered so
/// that tie-breaks over participant maps are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque handle to a playable media track
///
/// The engine never touches media bytes; a present ref only means "the call
/// service can render this track right now".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaTrackRef(String);

impl MediaTrackRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaTrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MediaTrackRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MediaTrackRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Media track kind
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Camera,
    Screen,
    Custom(String),
}

impl TrackKind {
    /// Whether this kind is delivered only on explicit subscription
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::Screen => write!(f, "screen"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Receive quality requested for a subscribed track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    High,
}

/// Pre-defined subscription profile a remote participant is assigned to
///
/// Quality is adapted by moving participants between profiles rather than by
/// re-tuning each participant's settings individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionProfile {
    /// Background participants not currently displayed
    Base,
    /// The participant occupying the secondary display slot
    ActiveRemote,
}

impl fmt::Display for SubscriptionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::ActiveRemote => write!(f, "active_remote"),
        }
    }
}

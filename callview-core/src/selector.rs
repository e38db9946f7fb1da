//! Display selector
//!
//! Decides which single remote participant occupies the secondary display
//! slot. Pure: same `(snapshot, previous)` input always yields the same
//! output, and repeated selection against an unchanged snapshot is a fixed
//! point.

use crate::registry::CallSnapshot;
use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};

/// Which remote participant to render, if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayChoice {
    pub participant_id: Option<ParticipantId>,
}

impl DisplayChoice {
    #[must_use]
    pub fn of(id: ParticipantId) -> Self {
        Self {
            participant_id: Some(id),
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            participant_id: None,
        }
    }
}

/// Why the current choice won its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// Exposes a playable screen-share track
    ScreenShare,
    /// Announces a custom video track (subscription may not exist yet)
    CustomTrack,
    /// Matches the snapshot's remote active speaker
    ActiveSpeaker,
    /// Previously displayed and still present; keeps the display stable
    Sticky,
    /// Nothing better: deterministic fallback over remaining participants
    Fallback,
    /// No remote participants at all
    Empty,
}

/// A display choice together with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub choice: DisplayChoice,
    pub reason: SelectionReason,
}

/// Choose the remote participant for the secondary display slot
///
/// Priority tiers, first match wins:
/// 1. a playable screen-share track,
/// 2. an announced custom video track,
/// 3. the remote active speaker,
/// 4. the previously displayed participant, if still present,
/// 5. the lowest-id remaining participant,
/// 6. nobody (empty call).
///
/// Within a tier the lowest participant id wins, so ties resolve identically
/// on every call with the same snapshot.
#[must_use]
pub fn select(snapshot: &CallSnapshot, previous: &DisplayChoice) -> Selection {
    // 1. A screen sharer.
    if let Some(id) = snapshot
        .remote
        .values()
        .find(|p| p.has_playable_screen())
        .map(|p| p.id.clone())
    {
        return Selection {
            choice: DisplayChoice::of(id),
            reason: SelectionReason::ScreenShare,
        };
    }

    // 2. A custom video track sharer. Announced is enough: custom tracks are
    //    not auto-subscribed, so the ref only becomes playable after the
    //    subscription adapter has acted on this very selection.
    if let Some(id) = snapshot
        .remote
        .values()
        .find(|p| p.first_custom_track_name().is_some())
        .map(|p| p.id.clone())
    {
        return Selection {
            choice: DisplayChoice::of(id),
            reason: SelectionReason::CustomTrack,
        };
    }

    // 3. The active speaker, unless it is the local participant.
    if let Some(speaker) = snapshot.remote_active_speaker() {
        return Selection {
            choice: DisplayChoice::of(speaker.id.clone()),
            reason: SelectionReason::ActiveSpeaker,
        };
    }

    // 4. Whoever was previously displayed, if still in the call.
    if let Some(previous_id) = &previous.participant_id {
        if snapshot.remote.contains_key(previous_id) {
            return Selection {
                choice: DisplayChoice::of(previous_id.clone()),
                reason: SelectionReason::Sticky,
            };
        }
    }

    // 5. Anyone else; the map is ordered so this is the lowest id.
    if let Some(id) = snapshot.remote.keys().next() {
        return Selection {
            choice: DisplayChoice::of(id.clone()),
            reason: SelectionReason::Fallback,
        };
    }

    // 6. Empty call.
    Selection {
        choice: DisplayChoice::none(),
        reason: SelectionReason::Empty,
    }
}

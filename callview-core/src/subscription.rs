//! Subscription adapter
//!
//! Computes the subscription intent every remote participant should have,
//! diffs it against what was last applied on the call service, and reconciles
//! asynchronous request completions under a last-writer-wins rule so an
//! out-of-order round trip can never regress the applied state.

use crate::config::ProfilesConfig;
use crate::registry::CallSnapshot;
use crate::selector::DisplayChoice;
use crate::types::{ParticipantId, Quality, SubscriptionProfile, TrackKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What we currently want a remote participant's subscription to be
///
/// Recomputed from scratch on every reconciliation pass; identical inputs
/// yield identical intents, which is what makes retries safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionIntent {
    pub participant_id: ParticipantId,
    pub profile: SubscriptionProfile,
    pub track_quality: BTreeMap<TrackKind, Quality>,
    /// Custom track explicitly subscribed for the displayed participant
    pub custom_track: Option<String>,
}

/// Change to a custom-track subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomTrackUpdate {
    Subscribe(String),
    Unsubscribe,
}

/// One request to the call service, carrying only the fields that changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub participant_id: ParticipantId,
    pub profile: Option<SubscriptionProfile>,
    /// Only the track kinds whose quality changed
    pub track_quality: Option<BTreeMap<TrackKind, Quality>>,
    pub custom_track: Option<CustomTrackUpdate>,
    /// The full intent this request drives toward; completions are matched
    /// against desire at completion time, not at issue time
    pub target: SubscriptionIntent,
}

/// Compute the desired intent for every remote participant
///
/// The displayed participant is assigned the `active_remote` profile with high
/// per-track quality and, if it announces a custom track, an explicit
/// subscription to that track. Everyone else gets `base`, low quality, and no
/// custom subscription. The local participant is never a target.
#[must_use]
pub fn desired_intents(
    snapshot: &CallSnapshot,
    choice: &DisplayChoice,
    profiles: &ProfilesConfig,
) -> BTreeMap<ParticipantId, SubscriptionIntent> {
    snapshot
        .remote
        .values()
        .map(|participant| {
            let displayed = choice.participant_id.as_ref() == Some(&participant.id);
            let (profile, quality) = if displayed {
                (
                    SubscriptionProfile::ActiveRemote,
                    profiles.active_remote.max_quality,
                )
            } else {
                (SubscriptionProfile::Base, profiles.base.max_quality)
            };

            let track_quality = participant
                .tracks
                .keys()
                .map(|kind| (kind.clone(), quality))
                .collect();

            let custom_track = if displayed {
                participant.first_custom_track_name().map(str::to_string)
            } else {
                None
            };

            let intent = SubscriptionIntent {
                participant_id: participant.id.clone(),
                profile,
                track_quality,
                custom_track,
            };
            (participant.id.clone(), intent)
        })
        .collect()
}

/// Diff desired against last-applied, emitting only the changed fields
///
/// A participant whose computed intent is already applied produces no request,
/// which bounds outbound traffic to the rate of actual state change. Requests
/// come out in participant-id order.
#[must_use]
pub fn diff(
    desired: &BTreeMap<ParticipantId, SubscriptionIntent>,
    last_applied: &BTreeMap<ParticipantId, SubscriptionIntent>,
) -> Vec<OutboundRequest> {
    let mut requests = Vec::new();

    for (id, intent) in desired {
        let request = match last_applied.get(id) {
            None => OutboundRequest {
                participant_id: id.clone(),
                profile: Some(intent.profile),
                track_quality: (!intent.track_quality.is_empty())
                    .then(|| intent.track_quality.clone()),
                custom_track: intent
                    .custom_track
                    .clone()
                    .map(CustomTrackUpdate::Subscribe),
                target: intent.clone(),
            },
            Some(applied) => {
                let profile = (intent.profile != applied.profile).then_some(intent.profile);

                let changed_quality: BTreeMap<TrackKind, Quality> = intent
                    .track_quality
                    .iter()
                    .filter(|(kind, quality)| applied.track_quality.get(*kind) != Some(*quality))
                    .map(|(kind, quality)| (kind.clone(), *quality))
                    .collect();
                let track_quality = (!changed_quality.is_empty()).then_some(changed_quality);

                let custom_track = if intent.custom_track == applied.custom_track {
                    None
                } else {
                    match &intent.custom_track {
                        Some(name) => Some(CustomTrackUpdate::Subscribe(name.clone())),
                        None => Some(CustomTrackUpdate::Unsubscribe),
                    }
                };

                if profile.is_none() && track_quality.is_none() && custom_track.is_none() {
                    continue;
                }

                OutboundRequest {
                    participant_id: id.clone(),
                    profile,
                    track_quality,
                    custom_track,
                    target: intent.clone(),
                }
            }
        };
        requests.push(request);
    }

    requests
}

#[derive(Debug, Default)]
struct LedgerState {
    desired: BTreeMap<ParticipantId, SubscriptionIntent>,
    last_applied: BTreeMap<ParticipantId, SubscriptionIntent>,
}

/// Shared record of desired vs last-applied subscription state
///
/// The only mutable state shared between the event-processing path and
/// request-completion callbacks; the single mutex serializes both, preserving
/// the last-writer-wins invariant.
#[derive(Debug, Default)]
pub struct SubscriptionLedger {
    state: Mutex<LedgerState>,
}

impl SubscriptionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute desired state and return the requests that close the gap
    ///
    /// Entries for participants no longer in the snapshot are dropped from
    /// both maps.
    pub fn reconcile(
        &self,
        snapshot: &CallSnapshot,
        choice: &DisplayChoice,
        profiles: &ProfilesConfig,
    ) -> Vec<OutboundRequest> {
        let desired = desired_intents(snapshot, choice, profiles);

        let mut state = self.state.lock();
        state
            .last_applied
            .retain(|id, _| snapshot.remote.contains_key(id));
        let requests = diff(&desired, &state.last_applied);
        state.desired = desired;
        requests
    }

    /// Record a successful request completion
    ///
    /// The target is installed into last-applied only if it still matches the
    /// current desired intent; a completion for a superseded value is
    /// discarded (last-writer-wins). Returns whether the completion was
    /// current.
    pub fn complete_ok(&self, target: &SubscriptionIntent) -> bool {
        let mut state = self.state.lock();
        if state.desired.get(&target.participant_id) == Some(target) {
            state
                .last_applied
                .insert(target.participant_id.clone(), target.clone());
            true
        } else {
            debug!(
                participant_id = %target.participant_id,
                "stale subscription completion discarded"
            );
            false
        }
    }

    /// Last-applied intent for a participant, if any
    #[must_use]
    pub fn last_applied(&self, id: &ParticipantId) -> Option<SubscriptionIntent> {
        self.state.lock().last_applied.get(id).cloned()
    }

    /// Currently desired intent for a participant, if any
    #[must_use]
    pub fn desired(&self, id: &ParticipantId) -> Option<SubscriptionIntent> {
        self.state.lock().desired.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CallEvent;
    use crate::participant::Participant;
    use crate::registry::ParticipantRegistry;
    use crate::selector::select;

    fn remote(id: &str) -> Participant {
        Participant::new(ParticipantId::from(id), false)
    }

    fn profiles() -> ProfilesConfig {
        ProfilesConfig::default()
    }

    fn snapshot_of(events: Vec<CallEvent>) -> CallSnapshot {
        let mut registry = ParticipantRegistry::new();
        let mut snapshot = registry.snapshot();
        for event in events {
            snapshot = registry.apply_event(event);
        }
        snapshot
    }

    fn camera(id: &str) -> Participant {
        remote(id).with_track(
            TrackKind::Camera,
            crate::types::MediaTrackRef::from(format!("cam-{id}")),
        )
    }

    #[test]
    fn displayed_participant_gets_active_remote_high() {
        let snapshot = snapshot_of(vec![
            CallEvent::RemoteJoined(camera("a")),
            CallEvent::RemoteJoined(camera("b")),
        ]);
        let choice = DisplayChoice::of(ParticipantId::from("a"));

        let desired = desired_intents(&snapshot, &choice, &profiles());

        let a = &desired[&ParticipantId::from("a")];
        assert_eq!(a.profile, SubscriptionProfile::ActiveRemote);
        assert_eq!(a.track_quality[&TrackKind::Camera], Quality::High);

        let b = &desired[&ParticipantId::from("b")];
        assert_eq!(b.profile, SubscriptionProfile::Base);
        assert_eq!(b.track_quality[&TrackKind::Camera], Quality::Low);
    }

    #[test]
    fn displayed_custom_track_is_marked_for_subscription() {
        let snapshot = snapshot_of(vec![CallEvent::RemoteJoined(
            remote("a").with_announced_track(TrackKind::Custom("stage".to_string())),
        )]);
        let choice = DisplayChoice::of(ParticipantId::from("a"));

        let desired = desired_intents(&snapshot, &choice, &profiles());
        assert_eq!(
            desired[&ParticipantId::from("a")].custom_track,
            Some("stage".to_string())
        );
    }

    #[test]
    fn local_participant_is_never_a_target() {
        let snapshot = snapshot_of(vec![
            CallEvent::LocalUpdated(Participant::new(ParticipantId::from("me"), true)),
            CallEvent::RemoteJoined(camera("a")),
        ]);

        let desired = desired_intents(&snapshot, &DisplayChoice::none(), &profiles());
        assert!(!desired.contains_key(&ParticipantId::from("me")));
    }

    #[test]
    fn desired_intents_are_idempotent() {
        let snapshot = snapshot_of(vec![
            CallEvent::RemoteJoined(camera("a")),
            CallEvent::RemoteJoined(camera("b")),
        ]);
        let choice = DisplayChoice::of(ParticipantId::from("b"));

        let first = desired_intents(&snapshot, &choice, &profiles());
        let second = desired_intents(&snapshot, &choice, &profiles());
        assert_eq!(first, second);
    }

    #[test]
    fn second_reconcile_without_change_emits_no_requests() {
        let snapshot = snapshot_of(vec![
            CallEvent::RemoteJoined(camera("a")),
            CallEvent::RemoteJoined(camera("b")),
        ]);
        let selection = select(&snapshot, &DisplayChoice::none());

        let ledger = SubscriptionLedger::new();
        let first = ledger.reconcile(&snapshot, &selection.choice, &profiles());
        assert!(!first.is_empty());
        for request in &first {
            assert!(ledger.complete_ok(&request.target));
        }

        let second = ledger.reconcile(&snapshot, &selection.choice, &profiles());
        assert!(second.is_empty());
    }

    #[test]
    fn diff_emits_only_changed_fields() {
        let snapshot = snapshot_of(vec![
            CallEvent::RemoteJoined(camera("a")),
            CallEvent::RemoteJoined(camera("b")),
        ]);
        let profiles = profiles();

        // Everything applied with "a" displayed.
        let applied =
            desired_intents(&snapshot, &DisplayChoice::of(ParticipantId::from("a")), &profiles);
        // Display moves to "b".
        let desired =
            desired_intents(&snapshot, &DisplayChoice::of(ParticipantId::from("b")), &profiles);

        let requests = diff(&desired, &applied);
        assert_eq!(requests.len(), 2);

        // Both participants change profile and camera quality, nothing else.
        for request in &requests {
            assert!(request.profile.is_some());
            let quality = request.track_quality.as_ref().expect("quality delta");
            assert_eq!(quality.len(), 1);
            assert!(request.custom_track.is_none());
        }
    }

    #[test]
    fn losing_the_display_slot_unsubscribes_the_custom_track() {
        let custom = remote("a").with_announced_track(TrackKind::Custom("stage".to_string()));
        let snapshot = snapshot_of(vec![CallEvent::RemoteJoined(custom)]);
        let profiles = profiles();

        let applied =
            desired_intents(&snapshot, &DisplayChoice::of(ParticipantId::from("a")), &profiles);
        let desired = desired_intents(&snapshot, &DisplayChoice::none(), &profiles);

        let requests = diff(&desired, &applied);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].custom_track,
            Some(CustomTrackUpdate::Unsubscribe)
        );
    }

    #[test]
    fn departed_participants_are_dropped_from_the_ledger() {
        let mut registry = ParticipantRegistry::new();
        let snapshot = registry.apply_event(CallEvent::RemoteJoined(camera("a")));
        let selection = select(&snapshot, &DisplayChoice::none());

        let ledger = SubscriptionLedger::new();
        for request in ledger.reconcile(&snapshot, &selection.choice, &profiles()) {
            ledger.complete_ok(&request.target);
        }
        assert!(ledger.last_applied(&ParticipantId::from("a")).is_some());

        let snapshot = registry.apply_event(CallEvent::RemoteLeft(ParticipantId::from("a")));
        let selection = select(&snapshot, &DisplayChoice::of(ParticipantId::from("a")));
        let requests = ledger.reconcile(&snapshot, &selection.choice, &profiles());

        assert!(requests.is_empty());
        assert!(ledger.last_applied(&ParticipantId::from("a")).is_none());
        assert!(ledger.desired(&ParticipantId::from("a")).is_none());
    }

    #[test]
    fn stale_completion_is_discarded() {
        let snapshot = snapshot_of(vec![
            CallEvent::RemoteJoined(camera("a")),
            CallEvent::RemoteJoined(camera("b")),
        ]);
        let profiles = profiles();
        let ledger = SubscriptionLedger::new();

        // "a" is displayed; its active_remote request goes out but has not
        // completed yet.
        let first = ledger.reconcile(
            &snapshot,
            &DisplayChoice::of(ParticipantId::from("a")),
            &profiles,
        );
        let stale_target = first
            .iter()
            .find(|r| r.participant_id == ParticipantId::from("a"))
            .expect("request for a")
            .target
            .clone();
        assert_eq!(stale_target.profile, SubscriptionProfile::ActiveRemote);

        // Desired state moves on: "b" is displayed now, and the base request
        // for "a" completes first.
        let second = ledger.reconcile(
            &snapshot,
            &DisplayChoice::of(ParticipantId::from("b")),
            &profiles,
        );
        let current_target = second
            .iter()
            .find(|r| r.participant_id == ParticipantId::from("a"))
            .expect("request for a")
            .target
            .clone();
        assert!(ledger.complete_ok(&current_target));

        // The stale active_remote completion arrives out of order and must
        // not overwrite the newer applied value.
        assert!(!ledger.complete_ok(&stale_target));
        assert_eq!(
            ledger
                .last_applied(&ParticipantId::from("a"))
                .expect("applied intent")
                .profile,
            SubscriptionProfile::Base
        );
    }

    #[test]
    fn uncompleted_request_is_rederived_on_next_reconcile() {
        let snapshot = snapshot_of(vec![CallEvent::RemoteJoined(camera("a"))]);
        let selection = select(&snapshot, &DisplayChoice::none());
        let ledger = SubscriptionLedger::new();

        // The request fails (never completed), so last-applied is unchanged
        // and reconciliation derives the identical delta again.
        let first = ledger.reconcile(&snapshot, &selection.choice, &profiles());
        let second = ledger.reconcile(&snapshot, &selection.choice, &profiles());
        assert_eq!(first, second);
    }
}

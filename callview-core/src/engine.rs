//! Engine orchestration
//!
//! Wires the pipeline together: one inbound event mutates the registry, the
//! selector recomputes the display choice, and the subscription ledger emits
//! the delta requests, which are issued to the call service fire-and-forget.
//! The whole pipeline for one event runs under a single lock so selection and
//! desired-state computation always see a coherent state triple.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event::CallEvent;
use crate::registry::{CallSnapshot, ParticipantRegistry};
use crate::selector::{select, DisplayChoice};
use crate::service::CallService;
use crate::subscription::{OutboundRequest, SubscriptionLedger};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

struct EngineState {
    registry: ParticipantRegistry,
    previous: DisplayChoice,
}

/// The selection-and-subscription engine
pub struct CallEngine {
    config: EngineConfig,

    /// Outbound subscription API of the call service
    service: Arc<dyn CallService>,

    /// Registry plus sticky display-choice memory, mutated one event at a time
    state: Mutex<EngineState>,

    /// Desired vs last-applied subscription state
    ledger: SubscriptionLedger,

    /// Latest display choice; notifies only when the value actually changes
    choice_tx: watch::Sender<DisplayChoice>,

    /// Non-fatal failures surfaced to the embedding layer
    error_tx: mpsc::UnboundedSender<EngineError>,

    /// Receiver for surfaced failures (taken once by the embedding layer)
    error_rx: Mutex<Option<mpsc::UnboundedReceiver<EngineError>>>,
}

impl CallEngine {
    #[must_use]
    pub fn new(config: EngineConfig, service: Arc<dyn CallService>) -> Arc<Self> {
        let (choice_tx, _) = watch::channel(DisplayChoice::none());
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        Arc::new(Self {
            config,
            service,
            state: Mutex::new(EngineState {
                registry: ParticipantRegistry::new(),
                previous: DisplayChoice::none(),
            }),
            ledger: SubscriptionLedger::new(),
            choice_tx,
            error_tx,
            error_rx: Mutex::new(Some(error_rx)),
        })
    }

    /// Watch the display choice for the secondary render slot
    ///
    /// The receiver wakes only when the choice differs from the previous one.
    #[must_use]
    pub fn display_choices(&self) -> watch::Receiver<DisplayChoice> {
        self.choice_tx.subscribe()
    }

    /// Take the failure channel (can only be called once)
    pub fn take_errors(&self) -> Option<mpsc::UnboundedReceiver<EngineError>> {
        self.error_rx.lock().take()
    }

    /// Current display choice
    #[must_use]
    pub fn current_choice(&self) -> DisplayChoice {
        self.choice_tx.borrow().clone()
    }

    /// Current call snapshot without applying an event
    #[must_use]
    pub fn snapshot(&self) -> CallSnapshot {
        self.state.lock().registry.snapshot()
    }

    /// Desired vs last-applied subscription record
    #[must_use]
    pub fn ledger(&self) -> &SubscriptionLedger {
        &self.ledger
    }

    /// Apply one call event in delivery order and return the new snapshot
    ///
    /// Never blocks on network I/O: the resulting subscription requests are
    /// spawned fire-and-forget, and their completions reconcile against the
    /// ledger asynchronously. Must be driven from a single logical event
    /// stream; events must not be reordered or dropped.
    pub fn apply_event(self: &Arc<Self>, event: CallEvent) -> CallSnapshot {
        let requests;
        let snapshot;
        {
            let mut state = self.state.lock();
            debug!(event = event.kind(), "applying call event");

            snapshot = state.registry.apply_event(event);
            let selection = select(&snapshot, &state.previous);

            if selection.choice != state.previous {
                info!(
                    version = snapshot.version,
                    participant_id = ?selection.choice.participant_id,
                    reason = ?selection.reason,
                    "display choice changed"
                );
            }
            state.previous = selection.choice.clone();

            requests = self
                .ledger
                .reconcile(&snapshot, &selection.choice, &self.config.profiles);

            // Published under the lock so observers see choices in event order.
            self.choice_tx.send_if_modified(|current| {
                if *current == selection.choice {
                    false
                } else {
                    *current = selection.choice.clone();
                    true
                }
            });
        }

        for request in requests {
            self.spawn_request(request);
        }

        snapshot
    }

    fn spawn_request(self: &Arc<Self>, request: OutboundRequest) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let participant_id = request.participant_id.clone();
            let target = request.target.clone();
            debug!(
                participant_id = %participant_id,
                profile = ?request.profile,
                custom_track = ?request.custom_track,
                "issuing subscription request"
            );

            match engine.service.request_subscription_update(request).await {
                Ok(()) => {
                    // A stale completion is silently discarded by the ledger;
                    // whatever superseded it already has its own request out.
                    engine.ledger.complete_ok(&target);
                }
                Err(source) => {
                    warn!(
                        participant_id = %participant_id,
                        error = %source,
                        "subscription request failed; next reconcile will retry"
                    );
                    let _ = engine.error_tx.send(EngineError::SubscriptionRequestFailed {
                        participant_id,
                        source,
                    });
                }
            }
        });
    }
}

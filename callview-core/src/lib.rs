//! `CallView` engine
//!
//! The decision layer of a group video-call client. Given the call service's
//! event stream (joins, leaves, track changes, active-speaker changes), the
//! engine decides which single remote participant occupies the secondary
//! display slot and what subscription quality/profile every remote participant
//! should receive, then negotiates that state with the call service without
//! ever letting an out-of-order network round trip regress the display.
//!
//! ## Architecture
//!
//! - **`ParticipantRegistry`**: versioned, immutable snapshots of call state
//! - **`select`**: pure priority policy for the secondary display slot
//! - **`SubscriptionLedger`**: desired-vs-applied diffing with a
//!   last-writer-wins completion rule
//! - **`CallEngine`**: pipeline orchestration and fire-and-forget requests
//!
//! Media bytes, rendering, and devices stay with the call service and the
//! presentation layer; the engine only consumes events and issues
//! subscription intents.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callview_core::{CallEngine, CallEvent, EngineConfig};
//!
//! let engine = CallEngine::new(EngineConfig::default(), call_service);
//! let mut choices = engine.display_choices();
//!
//! engine.apply_event(CallEvent::RemoteJoined(participant));
//! if choices.has_changed()? {
//!     render(choices.borrow_and_update().clone());
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod participant;
pub mod registry;
pub mod selector;
pub mod service;
pub mod subscription;
pub mod types;

pub use config::{EngineConfig, LoggingConfig, ProfileSettings, ProfilesConfig};
pub use engine::CallEngine;
pub use error::EngineError;
pub use event::CallEvent;
pub use participant::Participant;
pub use registry::{CallSnapshot, ParticipantRegistry};
pub use selector::{select, DisplayChoice, Selection, SelectionReason};
pub use service::CallService;
pub use subscription::{
    desired_intents, diff, CustomTrackUpdate, OutboundRequest, SubscriptionIntent,
    SubscriptionLedger,
};
pub use types::{MediaTrackRef, ParticipantId, Quality, SubscriptionProfile, TrackKind};

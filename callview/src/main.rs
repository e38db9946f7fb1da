//! Headless demo driver for the `CallView` engine
//!
//! Replays a scripted group call against a simulated call service so the
//! engine's display and subscription decisions can be observed from the log.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use callview_core::{
    logging, CallEngine, CallEvent, CallService, EngineConfig, EngineError, MediaTrackRef,
    OutboundRequest, Participant, ParticipantId, TrackKind,
};

/// Simulated call service: acknowledges every subscription request after a
/// small artificial round-trip delay, so completions overlap with later
/// events the way a real network does.
struct SimulatedCallService {
    round_trip: Duration,
}

#[async_trait]
impl CallService for SimulatedCallService {
    async fn request_subscription_update(&self, request: OutboundRequest) -> Result<()> {
        sleep(self.round_trip).await;
        info!(
            participant_id = %request.participant_id,
            profile = ?request.profile,
            track_quality = ?request.track_quality,
            custom_track = ?request.custom_track,
            "call service applied subscription update"
        );
        Ok(())
    }
}

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. CALLVIEW_CONFIG_PATH environment variable (explicit path)
/// 2. ./config.yaml (current working directory)
/// 3. Fall back to environment variables only
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = std::env::var("CALLVIEW_CONFIG_PATH")
        .ok()
        .filter(|p| std::path::Path::new(p).exists())
        .or_else(|| {
            let cwd = "config.yaml";
            std::path::Path::new(cwd)
                .exists()
                .then(|| cwd.to_string())
        });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        EngineConfig::from_file(&path)?
    } else {
        EngineConfig::from_env().unwrap_or_default()
    };

    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(EngineError::InvalidConfig(errors.join("; ")));
    }

    Ok(config)
}

fn remote(id: &str, name: &str) -> Participant {
    Participant::new(ParticipantId::from(id), false)
        .with_display_name(name)
        .with_track(TrackKind::Camera, MediaTrackRef::from(format!("cam-{id}")))
}

/// The scripted call: joins, speaker changes, a screen share, and a leave.
fn script() -> Vec<CallEvent> {
    vec![
        CallEvent::LocalUpdated(
            Participant::new(ParticipantId::from("local"), true).with_display_name("You"),
        ),
        CallEvent::RemoteJoined(remote("alice", "Alice")),
        CallEvent::RemoteJoined(remote("bob", "Bob")),
        CallEvent::ActiveSpeakerChanged(Some(ParticipantId::from("bob"))),
        CallEvent::RemoteJoined(remote("carol", "Carol")),
        CallEvent::RemoteUpdated(
            remote("carol", "Carol")
                .with_track(TrackKind::Screen, MediaTrackRef::from("screen-carol")),
        ),
        CallEvent::ActiveSpeakerChanged(Some(ParticipantId::from("alice"))),
        CallEvent::RemoteUpdated(remote("carol", "Carol")),
        CallEvent::RemoteLeft(ParticipantId::from("bob")),
        CallEvent::ActiveSpeakerChanged(None),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    logging::init_logging(&config.logging)?;

    info!("CallView demo starting");

    let service = Arc::new(SimulatedCallService {
        round_trip: Duration::from_millis(40),
    });
    let engine = CallEngine::new(config, service);

    let mut choices = engine.display_choices();
    let render_task = tokio::spawn(async move {
        while choices.changed().await.is_ok() {
            let choice = choices.borrow_and_update().clone();
            info!(participant_id = ?choice.participant_id, "secondary display slot");
        }
    });

    let mut errors = engine
        .take_errors()
        .expect("error channel taken exactly once");
    tokio::spawn(async move {
        while let Some(error) = errors.recv().await {
            tracing::warn!(%error, "engine reported failure");
        }
    });

    for event in script() {
        info!(event = event.kind(), "delivering event");
        engine.apply_event(event);
        sleep(Duration::from_millis(100)).await;
    }

    // Let in-flight completions drain before shutting down.
    sleep(Duration::from_millis(200)).await;
    drop(engine);
    let _ = render_task.await;

    info!("CallView demo finished");
    Ok(())
}

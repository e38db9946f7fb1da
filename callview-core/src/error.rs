use crate::types::ParticipantId;
use thiserror::Error;

/// Engine failure taxonomy
///
/// Nothing here is fatal: unknown-participant events are ignored at the
/// registry, and failed subscription requests are retried implicitly by the
/// next reconciliation pass recomputing the same delta.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("event references unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("subscription request failed for {participant_id}: {source}")]
    SubscriptionRequestFailed {
        participant_id: ParticipantId,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

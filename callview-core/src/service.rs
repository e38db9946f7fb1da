//! Call service collaborator seam

use crate::subscription::OutboundRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Outbound subscription API of the underlying call service
///
/// Implementations own transport, retries at the wire level, and media
/// delivery; the engine only issues best-effort subscription intents.
/// Calls for distinct participants may run concurrently; same-participant
/// calls are reconciled by the engine's last-writer-wins rule, so
/// implementations need no cross-call ordering of their own.
#[async_trait]
pub trait CallService: Send + Sync {
    /// Apply the changed subscription fields for one remote participant
    async fn request_subscription_update(&self, request: OutboundRequest) -> Result<()>;
}

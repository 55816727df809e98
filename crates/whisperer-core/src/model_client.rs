//! Abstract model-generation capability.

use crate::error::Result;
use crate::settings::GenerationSettings;
use async_trait::async_trait;

/// The hosted generative model, abstracted as an injectable capability.
///
/// The controller is written against this trait so tests can substitute a
/// deterministic stub returning scripted answers instead of invoking a
/// live external service. Implementations live at the boundary (see the
/// interaction crate); retry-on-infra-failure, if desired, belongs to the
/// implementation, never to the guardrail core.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generates an answer for `prompt`, grounded in `context`.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` when the underlying call fails
    /// (network/auth/rate-limit). The core propagates this to the caller
    /// without retrying.
    async fn generate(
        &self,
        prompt: &str,
        context: &[String],
        settings: &GenerationSettings,
    ) -> Result<String>;
}

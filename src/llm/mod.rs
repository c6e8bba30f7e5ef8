//! Text-generation collaborator.
//!
//! The engine only ever needs one operation: turn a system context and a
//! user context into text. Failures are typed so the calling steps can
//! decide whether to degrade (drafting, policy evaluation) or propagate.

mod disabled;
mod openai_compatible;

pub use disabled::DisabledGenerator;
pub use openai_compatible::OpenAiCompatibleGenerator;

use async_trait::async_trait;

use crate::config::{LlmConfig, LlmMode};
use crate::error::LlmError;

/// Trait for text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the given contexts.
    async fn generate(&self, system_context: &str, user_context: &str)
    -> Result<String, LlmError>;
}

/// Build the configured generator.
///
/// `Disabled` mode yields a generator whose every call errors; all call
/// sites degrade to deterministic text, so the engine stays fully
/// functional offline.
pub fn generator_from_config(
    config: &LlmConfig,
) -> Result<std::sync::Arc<dyn TextGenerator>, LlmError> {
    match config.mode {
        LlmMode::Live => Ok(std::sync::Arc::new(OpenAiCompatibleGenerator::new(
            config.clone(),
        )?)),
        LlmMode::Disabled => Ok(std::sync::Arc::new(DisabledGenerator)),
    }
}

//! Generator stub for offline mode.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::TextGenerator;

/// Always fails with [`LlmError::Disabled`].
///
/// Every generation call site degrades to deterministic fallback text, so
/// running with this generator exercises exactly those paths.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(
        &self,
        _system_context: &str,
        _user_context: &str,
    ) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }
}

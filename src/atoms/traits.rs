// ── Mdm Teo Atoms: Collaborator Traits ─────────────────────────────────────
// The engine talks to the outside world through exactly two seams: a text
// generator and a chat transport. Concrete backends live in engine/; tests
// plug in in-memory fakes.

use crate::atoms::error::EngineResult;
use async_trait::async_trait;
use mdmteo_core::ChatId;
use thiserror::Error;

/// What one generation call is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Persona and standing rules.
    pub system_instruction: String,
    /// Transcript followed by the per-fire instruction.
    pub prompt: String,
}

/// Why a generation call produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Request never got a response (DNS, TLS, timeout…).
    #[error("transport: {0}")]
    Transport(String),

    /// 401 / 403 from the backend.
    #[error("auth: {0}")]
    Auth(String),

    /// Any other non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Backend refused to answer (safety filter, recitation…).
    #[error("blocked: {0}")]
    Blocked(String),

    /// Call succeeded but carried no text.
    #[error("empty response")]
    EmptyResponse,
}

impl GenerationError {
    /// The service itself failed, as opposed to answering with nothing.
    /// A content block is an answer: the model just has nothing to say.
    pub fn is_service_error(&self) -> bool {
        !matches!(self, GenerationError::EmptyResponse | GenerationError::Blocked(_))
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    /// Single request/response. Implementations must not retry.
    async fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver `text` to `chat_id`. Delivery failures are the transport's
    /// concern; an `Err` is only logged by callers.
    async fn send(&self, chat_id: ChatId, text: &str) -> EngineResult<()>;
}

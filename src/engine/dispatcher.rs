// Mdm Teo — Batch Dispatcher
//
// Turns a fired batch into at most one outbound message:
//   transcript → prompt → one generation call → sentinel filter → send
//
// The snapshot/reset already happened under the chat lock when the batch was
// taken, so nothing here touches chat state. A failed call just means this
// cycle produced no reply.

use crate::atoms::constants::{
    FALLBACK_REPLY, INTERRUPT_INSTRUCTION, ORDINARY_INSTRUCTION, PERSONA_PROMPT, SILENCE_SENTINEL,
};
use crate::atoms::error::EngineResult;
use crate::atoms::traits::{ChatTransport, GenerationError, Generator, PromptRequest};
use log::{error, info, warn};
use mdmteo_core::{Batch, ChatId, Decision, SilenceSentinel};
use std::sync::Arc;

/// What a fire ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Generated reply was sent.
    Sent(String),
    /// Direct address came back silent; the fixed fallback was sent.
    Fallback(String),
    /// Ordinary fire, model chose silence. Nothing sent.
    Suppressed,
    /// Generation service failed. Nothing sent.
    Failed(GenerationError),
}

impl DispatchOutcome {
    /// Text that went out, if any.
    pub fn sent_text(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Sent(t) | DispatchOutcome::Fallback(t) => Some(t),
            _ => None,
        }
    }
}

pub struct BatchDispatcher {
    generator: Arc<dyn Generator>,
    transport: Arc<dyn ChatTransport>,
    persona: String,
    sentinel: SilenceSentinel,
    fallback_reply: String,
}

impl BatchDispatcher {
    pub fn new(generator: Arc<dyn Generator>, transport: Arc<dyn ChatTransport>) -> Self {
        BatchDispatcher {
            generator,
            transport,
            persona: PERSONA_PROMPT.to_string(),
            sentinel: SilenceSentinel::new(SILENCE_SENTINEL),
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_fallback_reply(mut self, reply: impl Into<String>) -> Self {
        self.fallback_reply = reply.into();
        self
    }

    pub fn build_request(&self, batch: &Batch) -> PromptRequest {
        let instruction = match batch.decision {
            Decision::FireInterrupt => INTERRUPT_INSTRUCTION,
            _ => ORDINARY_INSTRUCTION,
        };
        PromptRequest {
            system_instruction: self.persona.clone(),
            prompt: format!("Recent messages:\n{}\n\n{}", batch.transcript(), instruction),
        }
    }

    /// Run one batch to completion. Exactly one generation attempt.
    pub async fn fire(&self, batch: Batch) -> DispatchOutcome {
        let chat_id = batch.chat_id;
        let interrupt = batch.decision == Decision::FireInterrupt;
        let request = self.build_request(&batch);

        info!(
            "[dispatch] Chat {} firing {} ({} lines) via {}",
            chat_id,
            if interrupt { "interrupt" } else { "ordinary" },
            batch.lines.len(),
            self.generator.name()
        );

        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() && !self.sentinel.is_silence(&text) => {
                let reply = text.trim().to_string();
                return self.deliver(chat_id, DispatchOutcome::Sent(reply)).await;
            }
            Ok(_) => {}
            Err(e) if !e.is_service_error() => {
                info!("[dispatch] Chat {} got no text back: {}", chat_id, e);
            }
            Err(e) => {
                error!("[dispatch] Chat {} generation failed: {}", chat_id, e);
                return DispatchOutcome::Failed(e);
            }
        }

        if interrupt {
            info!("[dispatch] Chat {} addressed directly but model stayed silent, using fallback", chat_id);
            self.deliver(chat_id, DispatchOutcome::Fallback(self.fallback_reply.clone()))
                .await
        } else {
            info!("[dispatch] Chat {} model chose silence", chat_id);
            DispatchOutcome::Suppressed
        }
    }

    async fn deliver(&self, chat_id: ChatId, outcome: DispatchOutcome) -> DispatchOutcome {
        if let Some(text) = outcome.sent_text() {
            if let Err(e) = self.transport.send(chat_id, text).await {
                warn!("[dispatch] Chat {} send failed: {}", chat_id, e);
            }
        }
        outcome
    }

    /// Verbatim send that skips generation and chat state entirely.
    pub async fn force_send(&self, chat_id: ChatId, text: &str) -> EngineResult<()> {
        info!("[dispatch] Forced send to chat {}", chat_id);
        self.transport.send(chat_id, text).await
    }
}

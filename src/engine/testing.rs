// Mdm Teo — In-memory collaborators
//
// Fakes for the two collaborator seams. Used by unit tests here and by the
// integration suite in tests/.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::{ChatTransport, GenerationError, Generator, PromptRequest};
use async_trait::async_trait;
use mdmteo_core::ChatId;
use parking_lot::Mutex;
use std::collections::VecDeque;

enum Script {
    Replies(VecDeque<String>),
    Fail(GenerationError),
}

/// Replays scripted replies in order; `EmptyResponse` once they run out.
pub struct FakeGenerator {
    script: Mutex<Script>,
    calls: Mutex<Vec<PromptRequest>>,
}

impl FakeGenerator {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FakeGenerator {
            script: Mutex::new(Script::Replies(replies.into_iter().map(Into::into).collect())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: GenerationError) -> Self {
        FakeGenerator {
            script: Mutex::new(Script::Fail(err)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PromptRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        self.calls.lock().push(request.clone());
        match &mut *self.script.lock() {
            Script::Replies(queue) => queue.pop_front().ok_or(GenerationError::EmptyResponse),
            Script::Fail(err) => Err(err.clone()),
        }
    }
}

/// Records every send. Optionally fails them all.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        RecordingTransport { sent: Mutex::new(Vec::new()), fail: true }
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, chat_id: ChatId, text: &str) -> EngineResult<()> {
        self.sent.lock().push((chat_id, text.to_string()));
        if self.fail {
            return Err(EngineError::channel("recording", "send refused"));
        }
        Ok(())
    }
}

// ── Core Types ─────────────────────────────────────────────────────────────

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Opaque chat key. Telegram group ids are negative, so this is signed.
pub type ChatId = i64;

/// Whether a chat is a one-to-one conversation or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Direct,
    Group,
}

/// Chattiness profile. Controls how many ordinary messages accumulate before
/// the next batch fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Angry,
    #[default]
    Normal,
    Chill,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Angry, Mood::Normal, Mood::Chill];

    /// Inclusive sampling range for the next trigger threshold.
    pub fn threshold_range(self) -> RangeInclusive<u32> {
        match self {
            Mood::Angry => 2..=5,
            Mood::Normal => 10..=20,
            Mood::Chill => 30..=50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Angry => "angry",
            Mood::Normal => "normal",
            Mood::Chill => "chill",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angry" => Ok(Mood::Angry),
            "normal" => Ok(Mood::Normal),
            "chill" => Ok(Mood::Chill),
            other => Err(CoreError::UnknownMood(other.to_string())),
        }
    }
}

/// Outcome of evaluating the trigger policy for one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoFire,
    /// Threshold reached. The reply may be silenced by the sentinel.
    FireOrdinary,
    /// Direct address. Must produce a visible reply.
    FireInterrupt,
}

impl Decision {
    pub fn fires(self) -> bool {
        !matches!(self, Decision::NoFire)
    }
}

/// Inbound transport event, already normalised by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    /// Group title, when the transport knows it.
    pub chat_title: Option<String>,
    pub sender: String,
    pub text: String,
    pub is_reply_to_self: bool,
}

impl InboundMessage {
    /// Window line for this message: `speaker: text`.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.sender, self.text)
    }
}

/// One row of the admin status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatStatus {
    pub chat_id: ChatId,
    pub title: String,
    pub paused: bool,
    pub mood: Mood,
    /// `(counter, threshold)`; `None` until the chat's first buffered message.
    pub progress: Option<(u32, u32)>,
}

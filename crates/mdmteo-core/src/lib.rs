// ── Mdm Teo Core ───────────────────────────────────────────────────────────
// Pure chat-state and decision logic. No network, no async runtime.
// Dependency rule: nothing in this crate may know about Telegram, Gemini or
// HTTP. Collaborators live in the root `mdmteo` crate.

pub mod buffer;
pub mod error;
pub mod policy;
pub mod store;
pub mod threshold;
pub mod types;

pub use buffer::{ConversationBuffer, WINDOW_CAPACITY};
pub use error::{CoreError, CoreResult};
pub use policy::{evaluate, AddressDetector, SilenceSentinel};
pub use store::{Batch, ChatStore, Observation};
pub use threshold::{RandomThresholds, ScriptedThresholds, ThresholdSource};
pub use types::{ChatId, ChatKind, ChatStatus, Decision, InboundMessage, Mood};

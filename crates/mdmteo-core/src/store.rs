// ── Chat Store ─────────────────────────────────────────────────────────────
// Per-chat state behind per-key locks.
//
//   registry — chat id → display name, append-only
//   paused   — chats that are muted
//   moods    — chat id → chattiness profile (absent = default mood)
//   slots    — chat id → Mutex<Option<ConversationBuffer>>
//
// The slot mutex is the per-chat critical section: append, evaluate and the
// snapshot/reset pair happen under it as one unit, and admin mutations that
// touch a chat take the same lock. Lock order is always slot first, then the
// shared maps. The maps themselves are only held for a single read or write.
// No lock in here is ever held across an await.

use crate::buffer::ConversationBuffer;
use crate::policy::evaluate;
use crate::threshold::ThresholdSource;
use crate::types::{ChatId, ChatKind, ChatStatus, Decision, InboundMessage, Mood};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

type Slot = Arc<Mutex<Option<ConversationBuffer>>>;

/// A fired batch: the window as it stood when the decision was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub chat_id: ChatId,
    pub decision: Decision,
    pub lines: Vec<String>,
}

impl Batch {
    /// One line per window entry, oldest first.
    pub fn transcript(&self) -> String {
        self.lines.join("\n")
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Chat is muted; nothing was recorded.
    Paused,
    /// Appended, threshold not yet reached.
    Buffered { counter: u32, threshold: u32 },
    /// Appended and fired; counter already reset.
    Fire(Batch),
}

pub struct ChatStore {
    registry: RwLock<BTreeMap<ChatId, String>>,
    paused: RwLock<HashSet<ChatId>>,
    moods: RwLock<HashMap<ChatId, Mood>>,
    slots: RwLock<HashMap<ChatId, Slot>>,
    default_mood: Mood,
    thresholds: Arc<dyn ThresholdSource>,
}

impl ChatStore {
    pub fn new(thresholds: Arc<dyn ThresholdSource>) -> Self {
        ChatStore {
            registry: RwLock::new(BTreeMap::new()),
            paused: RwLock::new(HashSet::new()),
            moods: RwLock::new(HashMap::new()),
            slots: RwLock::new(HashMap::new()),
            default_mood: Mood::default(),
            thresholds,
        }
    }

    pub fn with_default_mood(mut self, mood: Mood) -> Self {
        self.default_mood = mood;
        self
    }

    fn slot(&self, chat_id: ChatId) -> Slot {
        if let Some(slot) = self.slots.read().get(&chat_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    fn existing_slot(&self, chat_id: ChatId) -> Option<Slot> {
        self.slots.read().get(&chat_id).cloned()
    }

    // ── Registry ───────────────────────────────────────────────────────

    /// Record (or refresh) a group's display name. Last write wins.
    pub fn register(&self, chat_id: ChatId, title: &str) {
        let mut registry = self.registry.write();
        if registry.get(&chat_id).map(String::as_str) != Some(title) {
            debug!("[store] Learned chat {} = {:?}", chat_id, title);
            registry.insert(chat_id, title.to_string());
        }
    }

    pub fn title(&self, chat_id: ChatId) -> Option<String> {
        self.registry.read().get(&chat_id).cloned()
    }

    pub fn known_chats(&self) -> usize {
        self.registry.read().len()
    }

    // ── Pause / mood ───────────────────────────────────────────────────

    pub fn is_paused(&self, chat_id: ChatId) -> bool {
        self.paused.read().contains(&chat_id)
    }

    pub fn mood(&self, chat_id: ChatId) -> Mood {
        self.moods.read().get(&chat_id).copied().unwrap_or(self.default_mood)
    }

    /// Returns false if the chat was already paused.
    pub fn pause(&self, chat_id: ChatId) -> bool {
        let slot = self.slot(chat_id);
        let _guard = slot.lock();
        let changed = self.paused.write().insert(chat_id);
        info!("[store] Paused chat {}", chat_id);
        changed
    }

    /// Returns false if the chat was not paused.
    pub fn resume(&self, chat_id: ChatId) -> bool {
        let slot = self.slot(chat_id);
        let _guard = slot.lock();
        let changed = self.paused.write().remove(&chat_id);
        info!("[store] Resumed chat {}", chat_id);
        changed
    }

    /// Store the new mood. If the chat already has a buffer its threshold is
    /// redrawn from the new mood right away; the counter is left alone.
    /// Returns the new threshold when one was drawn.
    pub fn set_mood(&self, chat_id: ChatId, mood: Mood) -> Option<u32> {
        let slot = self.slot(chat_id);
        let mut guard = slot.lock();
        self.moods.write().insert(chat_id, mood);
        let buffer = guard.as_mut()?;
        let threshold = self.thresholds.next_threshold(mood);
        buffer.set_threshold(threshold);
        info!("[store] Chat {} mood={} threshold={}", chat_id, mood, threshold);
        Some(threshold)
    }

    // ── Message path ───────────────────────────────────────────────────

    /// Append → evaluate → (snapshot + reset) for one message, atomically
    /// with respect to every other message and admin mutation on this chat.
    pub fn observe(&self, msg: &InboundMessage, is_direct_address: bool) -> Observation {
        if msg.chat_kind == ChatKind::Group {
            let title = msg
                .chat_title
                .clone()
                .unwrap_or_else(|| format!("chat {}", msg.chat_id));
            self.register(msg.chat_id, &title);
        }

        let slot = self.slot(msg.chat_id);
        let mut guard = slot.lock();
        if self.is_paused(msg.chat_id) {
            return Observation::Paused;
        }

        let mood = self.mood(msg.chat_id);
        let buffer = guard
            .get_or_insert_with(|| ConversationBuffer::new(self.thresholds.next_threshold(mood)));
        buffer.append(msg.transcript_line());

        let decision = evaluate(buffer, is_direct_address);
        if !decision.fires() {
            return Observation::Buffered {
                counter: buffer.counter(),
                threshold: buffer.threshold(),
            };
        }

        let next = self.thresholds.next_threshold(mood);
        let lines = buffer.take_batch(next);
        debug!(
            "[store] Chat {} fired {:?} with {} lines, next threshold {}",
            msg.chat_id,
            decision,
            lines.len(),
            next
        );
        Observation::Fire(Batch { chat_id: msg.chat_id, decision, lines })
    }

    // ── Inspection ─────────────────────────────────────────────────────

    /// `(counter, threshold)` for a chat with a buffer.
    pub fn progress(&self, chat_id: ChatId) -> Option<(u32, u32)> {
        let slot = self.existing_slot(chat_id)?;
        let guard = slot.lock();
        guard.as_ref().map(|b| (b.counter(), b.threshold()))
    }

    pub fn window(&self, chat_id: ChatId) -> Option<Vec<String>> {
        let slot = self.existing_slot(chat_id)?;
        let guard = slot.lock();
        guard.as_ref().map(ConversationBuffer::snapshot_window)
    }

    /// Every registered chat, ordered by id.
    pub fn status(&self) -> Vec<ChatStatus> {
        let registry = self.registry.read().clone();
        registry
            .into_iter()
            .map(|(chat_id, title)| ChatStatus {
                chat_id,
                title,
                paused: self.is_paused(chat_id),
                mood: self.mood(chat_id),
                progress: self.progress(chat_id),
            })
            .collect()
    }
}

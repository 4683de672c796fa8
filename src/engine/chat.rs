// Mdm Teo — Inbound Message Path
//
// registry update → pause check → append → evaluate → (fire)
//
// `observe` is synchronous and cheap so transports can call it inline, in
// delivery order. Only the returned batch's dispatch awaits the network.

use crate::engine::channels::truncate_utf8;
use crate::engine::dispatcher::{BatchDispatcher, DispatchOutcome};
use log::debug;
use mdmteo_core::{AddressDetector, ChatStore, InboundMessage, Observation};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ChatEngine {
    store: Arc<ChatStore>,
    detector: RwLock<AddressDetector>,
    dispatcher: Arc<BatchDispatcher>,
}

impl ChatEngine {
    pub fn new(
        store: Arc<ChatStore>,
        detector: AddressDetector,
        dispatcher: Arc<BatchDispatcher>,
    ) -> Self {
        ChatEngine { store, detector: RwLock::new(detector), dispatcher }
    }

    /// Install the bot's own handle (learned from the transport at connect).
    pub fn set_handle(&self, handle: &str) {
        let mut detector = self.detector.write();
        *detector = detector.clone().with_handle(handle);
    }

    pub fn store(&self) -> &Arc<ChatStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<BatchDispatcher> {
        &self.dispatcher
    }

    /// Record one message and decide. A returned `Fire` has already been
    /// snapshotted and reset; hand it to the dispatcher.
    pub fn observe(&self, msg: &InboundMessage) -> Observation {
        let direct = self
            .detector
            .read()
            .is_direct_address(&msg.text, msg.is_reply_to_self);
        debug!(
            "[engine] Chat {} <{}> {}{}",
            msg.chat_id,
            msg.sender,
            truncate_utf8(&msg.text, 50),
            if direct { " [direct]" } else { "" }
        );
        self.store.observe(msg, direct)
    }

    /// Observe and, if it fires, dispatch inline.
    pub async fn handle(&self, msg: &InboundMessage) -> Option<DispatchOutcome> {
        match self.observe(msg) {
            Observation::Fire(batch) => Some(self.dispatcher.fire(batch).await),
            Observation::Paused | Observation::Buffered { .. } => None,
        }
    }
}

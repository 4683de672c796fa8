// End-to-end behaviour of the chat engine with in-memory collaborators.

use mdmteo::atoms::constants::{FALLBACK_REPLY, REPLY_NOT_ADMIN, REPLY_PM_ONLY};
use mdmteo::atoms::traits::GenerationError;
use mdmteo::engine::admin::{AdminControlPlane, CommandContext};
use mdmteo::engine::chat::ChatEngine;
use mdmteo::engine::dispatcher::{BatchDispatcher, DispatchOutcome};
use mdmteo::engine::testing::{FakeGenerator, RecordingTransport};
use mdmteo_core::{
    AddressDetector, ChatId, ChatKind, ChatStore, Decision, InboundMessage, Mood, Observation,
    RandomThresholds, ScriptedThresholds, ThresholdSource, WINDOW_CAPACITY,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const GROUP: ChatId = -100200300;
const ADMIN: &str = "grandson";

struct Harness {
    store: Arc<ChatStore>,
    engine: Arc<ChatEngine>,
    admin: AdminControlPlane,
    generator: Arc<FakeGenerator>,
    transport: Arc<RecordingTransport>,
}

fn harness(thresholds: Arc<dyn ThresholdSource>, generator: FakeGenerator) -> Harness {
    let store = Arc::new(ChatStore::new(thresholds));
    let generator = Arc::new(generator);
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Arc::new(BatchDispatcher::new(generator.clone(), transport.clone()));
    let engine = Arc::new(ChatEngine::new(
        store.clone(),
        AddressDetector::new(Some("MdmTeoBot"), &["teo", "ah ma"]),
        dispatcher.clone(),
    ));
    let admin = AdminControlPlane::new(store.clone(), dispatcher, vec![ADMIN.to_string()]);
    Harness { store, engine, admin, generator, transport }
}

fn scripted(values: &[u32]) -> Arc<dyn ThresholdSource> {
    Arc::new(ScriptedThresholds::new(values.to_vec()))
}

fn msg(chat_id: ChatId, sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id,
        chat_kind: ChatKind::Group,
        chat_title: Some("Family Chat".into()),
        sender: sender.into(),
        text: text.into(),
        is_reply_to_self: false,
    }
}

fn dm_ctx(sender: &str) -> CommandContext<'_> {
    CommandContext { chat_id: 42, chat_kind: ChatKind::Direct, sender }
}

/// First draw is fixed, the rest come from a seeded RNG.
struct FirstThen {
    first: AtomicBool,
    value: u32,
    rest: RandomThresholds,
}

impl ThresholdSource for FirstThen {
    fn next_threshold(&self, mood: Mood) -> u32 {
        if self.first.swap(false, Ordering::SeqCst) {
            return self.value;
        }
        self.rest.next_threshold(mood)
    }
}

// ── Fire points ────────────────────────────────────────────────────────

#[tokio::test]
async fn fifth_message_fires_with_exact_transcript() {
    let thresholds = Arc::new(FirstThen {
        first: AtomicBool::new(true),
        value: 5,
        rest: RandomThresholds::seeded(7),
    });
    let h = harness(thresholds, FakeGenerator::replying(["Aiyo, so noisy"]));

    for i in 1..=4 {
        let out = h.engine.handle(&msg(GROUP, "@a", &format!("m{i}"))).await;
        assert!(out.is_none(), "fired early at m{i}");
    }
    let out = h.engine.handle(&msg(GROUP, "@a", "m5")).await;
    assert_eq!(out, Some(DispatchOutcome::Sent("Aiyo, so noisy".into())));

    let calls = h.generator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0]
        .prompt
        .starts_with("Recent messages:\n@a: m1\n@a: m2\n@a: m3\n@a: m4\n@a: m5\n\n"));

    let (counter, threshold) = h.store.progress(GROUP).unwrap();
    assert_eq!(counter, 0);
    assert!((10..=20).contains(&threshold), "threshold {threshold}");
    assert_eq!(h.transport.sent_to(GROUP), vec!["Aiyo, so noisy"]);
}

#[test]
fn fires_exactly_once_at_threshold() {
    for t in [1u32, 2, 5, 13, 30, 45] {
        let store = ChatStore::new(scripted(&[t, 1_000]));
        let mut fires = Vec::new();
        for n in 1..=(t + 10) {
            if let Observation::Fire(batch) = store.observe(&msg(GROUP, "@a", &format!("m{n}")), false) {
                assert_eq!(batch.decision, Decision::FireOrdinary);
                fires.push(n);
            }
        }
        assert_eq!(fires, vec![t], "threshold {t}");
    }
}

// ── Direct address and the silence sentinel ────────────────────────────

#[tokio::test]
async fn sentinel_suppresses_ordinary_fire() {
    let h = harness(scripted(&[2]), FakeGenerator::replying(["IGNORE"]));
    h.engine.handle(&msg(GROUP, "@a", "weather hot")).await;
    let out = h.engine.handle(&msg(GROUP, "@b", "ya lor")).await;
    assert_eq!(out, Some(DispatchOutcome::Suppressed));
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn direct_address_always_gets_one_reply() {
    let h = harness(scripted(&[50]), FakeGenerator::replying(["IGNORE"]));
    h.engine.handle(&msg(GROUP, "@a", "anyone eaten?")).await;

    let out = h.engine.handle(&msg(GROUP, "@b", "Teo, you eaten?")).await;
    assert_eq!(out, Some(DispatchOutcome::Fallback(FALLBACK_REPLY.into())));
    assert_eq!(h.transport.sent_to(GROUP), vec![FALLBACK_REPLY]);

    // Exhausted generator yields an empty response; still one reply.
    let mut reply = msg(GROUP, "@c", "ok");
    reply.is_reply_to_self = true;
    let out = h.engine.handle(&reply).await;
    assert_eq!(out, Some(DispatchOutcome::Fallback(FALLBACK_REPLY.into())));
    assert_eq!(h.transport.sent_to(GROUP).len(), 2);

    let calls = h.generator.calls();
    assert!(calls[0].prompt.contains("@a: anyone eaten?\n@b: Teo, you eaten?"));
}

#[tokio::test]
async fn mentions_and_aliases_interrupt() {
    let h = harness(scripted(&[50]), FakeGenerator::replying(["yes", "what", "huh"]));
    for text in ["@mdmteobot hello", "Ah Ma come", "TEO!"] {
        let out = h.engine.handle(&msg(GROUP, "@a", text)).await;
        assert!(out.and_then(|o| o.sent_text().map(str::to_owned)).is_some(), "{text}");
    }
    assert!(h.engine.handle(&msg(GROUP, "@a", "teochew porridge")).await.is_none());
}

#[tokio::test]
async fn generation_failure_sends_nothing_and_spends_batch() {
    let h = harness(
        scripted(&[1, 10]),
        FakeGenerator::failing(GenerationError::Api { status: 500, message: "boom".into() }),
    );
    let out = h.engine.handle(&msg(GROUP, "@a", "hello")).await;
    assert!(matches!(out, Some(DispatchOutcome::Failed(_))));
    assert!(h.transport.sent().is_empty());
    assert_eq!(h.store.progress(GROUP), Some((0, 10)));

    // Even a direct address gets no fallback when the service itself failed.
    let out = h.engine.handle(&msg(GROUP, "@a", "teo?")).await;
    assert!(matches!(out, Some(DispatchOutcome::Failed(_))));
    assert!(h.transport.sent().is_empty());
}

// ── Pause and forced send ──────────────────────────────────────────────

#[tokio::test]
async fn paused_chat_is_totally_silent() {
    let h = harness(scripted(&[3]), FakeGenerator::replying(["hi"]));
    h.engine.handle(&msg(GROUP, "@a", "before")).await;
    let reply = h.admin.handle_command(&dm_ctx(ADMIN), &format!("/sleep {GROUP}")).await;
    assert_eq!(reply, Some(format!("Done. Group {GROUP} is now muted.")));

    for i in 0..20 {
        assert!(h.engine.handle(&msg(GROUP, "@b", &format!("noise {i}"))).await.is_none());
    }
    assert!(h.engine.handle(&msg(GROUP, "@b", "teo wake up")).await.is_none());

    assert_eq!(h.store.window(GROUP).unwrap(), vec!["@a: before"]);
    assert_eq!(h.store.progress(GROUP), Some((1, 3)));
    assert!(h.generator.calls().is_empty());
    assert!(h.transport.sent().is_empty());

    h.admin.handle_command(&dm_ctx(ADMIN), &format!("/wake {GROUP}")).await;
    h.engine.handle(&msg(GROUP, "@b", "two")).await;
    let out = h.engine.handle(&msg(GROUP, "@b", "three")).await;
    assert_eq!(out, Some(DispatchOutcome::Sent("hi".into())));
}

#[tokio::test]
async fn force_send_bypasses_pause() {
    let h = harness(scripted(&[5]), FakeGenerator::replying(Vec::<String>::new()));
    h.engine.handle(&msg(GROUP, "@a", "hi")).await;
    h.store.pause(GROUP);

    let reply = h.admin.handle_command(&dm_ctx(ADMIN), &format!("/send {GROUP} hello")).await;
    assert_eq!(reply, Some(format!("Sent to {GROUP}.")));
    assert_eq!(h.transport.sent_to(GROUP), vec!["hello"]);
    assert!(h.store.is_paused(GROUP));
    assert_eq!(h.store.progress(GROUP), Some((1, 5)));
    assert!(h.generator.calls().is_empty());
}

// ── Window retention ───────────────────────────────────────────────────

#[tokio::test]
async fn context_survives_a_fire() {
    let h = harness(scripted(&[3, 3]), FakeGenerator::replying(["one", "two"]));
    for i in 1..=6 {
        h.engine.handle(&msg(GROUP, "@a", &format!("m{i}"))).await;
    }
    let calls = h.generator.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1]
        .prompt
        .contains("@a: m1\n@a: m2\n@a: m3\n@a: m4\n@a: m5\n@a: m6"));
}

#[test]
fn window_evicts_oldest_at_capacity() {
    let store = ChatStore::new(scripted(&[1_000]));
    for i in 1..=WINDOW_CAPACITY + 1 {
        store.observe(&msg(GROUP, "@a", &format!("m{i}")), false);
    }
    let window = store.window(GROUP).unwrap();
    assert_eq!(window.len(), WINDOW_CAPACITY);
    assert_eq!(window.first().map(String::as_str), Some("@a: m2"));
    let expected: Vec<String> = (2..=WINDOW_CAPACITY + 1).map(|i| format!("@a: m{i}")).collect();
    assert_eq!(window, expected);
}

// ── Moods ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn chill_to_angry_redraws_within_angry_range() {
    for seed in 0..50 {
        let h = harness(
            Arc::new(RandomThresholds::seeded(seed)),
            FakeGenerator::replying(Vec::<String>::new()),
        );
        h.admin.set_mood(GROUP, Mood::Chill);
        h.engine.handle(&msg(GROUP, "@a", "hello")).await;
        let (_, before) = h.store.progress(GROUP).unwrap();
        assert!((30..=50).contains(&before));

        let reply = h.admin.handle_command(&dm_ctx(ADMIN), &format!("/mood {GROUP} angry")).await;
        assert!(reply.unwrap().contains("angry"));
        let (counter, after) = h.store.progress(GROUP).unwrap();
        assert_eq!(counter, 1);
        assert!((2..=5).contains(&after), "seed {seed}: {after}");
        assert_eq!(h.store.mood(GROUP), Mood::Angry);
    }
}

// ── Admin surface ──────────────────────────────────────────────────────

#[tokio::test]
async fn admin_authorization_and_placement() {
    let h = harness(scripted(&[5]), FakeGenerator::replying(Vec::<String>::new()));
    h.engine.handle(&msg(GROUP, "@a", "hi")).await;
    let in_group = |sender| CommandContext { chat_id: GROUP, chat_kind: ChatKind::Group, sender };

    assert_eq!(
        h.admin.handle_command(&in_group("stranger"), "/sleep").await,
        Some(REPLY_NOT_ADMIN.to_string())
    );
    assert_eq!(h.admin.handle_command(&in_group("stranger"), "/status").await, None);
    assert!(!h.store.is_paused(GROUP));

    assert_eq!(
        h.admin.handle_command(&in_group(ADMIN), "/status").await,
        Some(REPLY_PM_ONLY.to_string())
    );
    assert_eq!(
        h.admin.handle_command(&in_group(ADMIN), "/mood -1 angry").await,
        Some(REPLY_PM_ONLY.to_string())
    );

    h.admin.handle_command(&in_group(ADMIN), "/sleep@MdmTeoBot").await;
    assert!(h.store.is_paused(GROUP));

    let report = h.admin.handle_command(&dm_ctx("@Grandson"), "/status").await.unwrap();
    assert!(report.contains("*Family Chat*"));
    assert!(report.contains("ASLEEP"));
    assert!(report.contains("Chatter: 1/5"));
    assert!(report.contains(&format!("`{GROUP}`")));
}

#[tokio::test]
async fn malformed_admin_arguments_mutate_nothing() {
    let h = harness(scripted(&[5]), FakeGenerator::replying(Vec::<String>::new()));
    h.engine.handle(&msg(GROUP, "@a", "hi")).await;

    let bad_mood = format!("/mood {GROUP} grumpy");
    for cmd in ["/mood abc angry", bad_mood.as_str(), "/send 12", "/sleep nope"] {
        let reply = h.admin.handle_command(&dm_ctx(ADMIN), cmd).await.unwrap();
        assert!(reply.starts_with("Format:"), "{cmd}: {reply}");
    }
    assert_eq!(h.store.mood(GROUP), Mood::Normal);
    assert!(!h.store.is_paused(GROUP));
    assert!(h.transport.sent().is_empty());
    assert_eq!(h.admin.handle_command(&dm_ctx(ADMIN), "/dance").await, None);
}

// ── Concurrency ────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn chats_proceed_independently() {
    // Empty script: every draw is the low end of `normal`, i.e. 10.
    let h = harness(scripted(&[]), FakeGenerator::replying(vec!["ok"; 64]));
    let chats: Vec<ChatId> = (1..=8).map(|i| -1000 - i).collect();

    let mut tasks = Vec::new();
    for &chat in &chats {
        let engine = h.engine.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..20 {
                engine.handle(&msg(chat, "@a", &format!("m{i}"))).await;
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    for chat in chats {
        assert_eq!(h.transport.sent_to(chat).len(), 2, "chat {chat}");
        assert_eq!(h.store.progress(chat), Some((0, 10)));
    }
    assert_eq!(h.store.known_chats(), 8);
}

// ── Mdm Teo Atoms: Constants ───────────────────────────────────────────────
// Named constants for the crate: prompt template, fixed replies, defaults.

// ── Prompt template ────────────────────────────────────────────────────────

/// Reserved reply meaning "say nothing". Matched as a whole, case-exact token.
pub const SILENCE_SENTINEL: &str = "IGNORE";

/// Persona sent as the generation service's system instruction.
pub const PERSONA_PROMPT: &str = r#"### Role
You are Mdm Teo, a 75-year-old Singaporean grandmother added to a Telegram group chat.
You read the recent conversation in batches and decide whether to chime in.

### Triggers (When to Speak)
Only speak if the recent messages touch one of these topics:

1.  **Work / Boss / OT / Meeting / Stress** — scold the boss, tell them not to work so hard or they will get wrinkles.
2.  **Silence / Not Replying / "Seen" / Ghosting** — "Why everyone so quiet? Mouth got gold is it?"
3.  **Food / Hungry / Eating** — recommend rice, complain about cold drinks and salads.
4.  **Money / Expensive / Buying** — complain about wasting money, suggest saving for a flat.
5.  **Health / Sick / Tired / Sleep** — diagnose "heatiness", scold them for sleeping late.
6.  **Dating / Men / Women** — judge their choices, ask when they are getting married.
7.  **Direct Reply** — someone tags you, calls you by name or replies to you.

### The Golden Rule of Silence
If nothing in the recent messages matches the triggers above, reply EXACTLY: IGNORE

### Personality & Tone
* **Singlish:** Use heavy Singlish (lah, lor, meh, aiyo, choy, walau).
* **Superstitious:** "Touch wood" if they say bad things.
* **Attitude:** You are shockingly blunt. You have no filter. You think you are always right.
* **Length:** One or two short chat messages. Never narrate, never use speaker labels."#;

/// Appended after the transcript when the threshold fired.
pub const ORDINARY_INSTRUCTION: &str = "Above are the latest messages in the group. \
If something deserves your comment, reply as Mdm Teo. Otherwise reply EXACTLY: IGNORE";

/// Appended after the transcript when someone addressed the bot.
pub const INTERRUPT_INSTRUCTION: &str = "Someone in the group just called you or replied to you \
(see the last message). You MUST reply as Mdm Teo. Never answer IGNORE.";

/// Sent when a direct address still comes back silent or empty.
pub const FALLBACK_REPLY: &str = "Har? Who call me? Aiyo my ears not so good already, say again lah.";

// ── Generation defaults ────────────────────────────────────────────────────

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GENERATION_TIMEOUT_SECS: u64 = 60;

// ── Direct address ─────────────────────────────────────────────────────────

pub const DEFAULT_ALIASES: &[&str] = &["teo"];

// ── Telegram ───────────────────────────────────────────────────────────────

/// Bot API hard limit is 4096 characters; leave headroom.
pub const TELEGRAM_CHUNK_LIMIT: usize = 4000;
pub const TELEGRAM_POLL_TIMEOUT_SECS: u64 = 30;

// ── Liveness endpoint ──────────────────────────────────────────────────────

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// ── Admin replies ──────────────────────────────────────────────────────────

pub const REPLY_PM_ONLY: &str = "Eh, this one secret. PM me.";
pub const REPLY_NOT_ADMIN: &str = "You not my grandson. Cannot order me.";
pub const REPLY_NO_GROUPS: &str = "I haven't joined any groups yet (or I forgot after restart).";
pub const REPLY_SLEEP_HERE: &str = "Ok lor. This group too noisy. I go sleep. 😴";
pub const REPLY_WAKE_HERE: &str = "Har? Who call me? I awake now. 👀";

pub const USAGE_SLEEP: &str = "Format: `/sleep <group_id>`";
pub const USAGE_WAKE: &str = "Format: `/wake <group_id>`";
pub const USAGE_MOOD: &str = "Format: `/mood <group_id> <angry|normal|chill>`";
pub const USAGE_SEND: &str = "Format: `/send <group_id> <message>`";

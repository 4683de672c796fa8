// Mdm Teo — Telegram Bot Bridge
//
// Connects to Telegram via the Bot API using long-polling (getUpdates).
// No public URL needed and no webhooks.
//
// Every text update is either an admin command (leading `/`) or a chat
// message. Chat messages go through `ChatEngine::observe` inline, in
// delivery order; only the generation + send for a fired batch is spawned.

use crate::atoms::constants::{TELEGRAM_CHUNK_LIMIT, TELEGRAM_POLL_TIMEOUT_SECS};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::ChatTransport;
use crate::engine::admin::{split_command, AdminControlPlane, CommandContext};
use crate::engine::channels;
use crate::engine::chat::ChatEngine;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use mdmteo_core::{ChatId, ChatKind, InboundMessage, Observation};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ── Telegram API Types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<TgMessage>>,
}

#[derive(Debug, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

/// Identity returned by getMe.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: i64,
    pub username: String,
}

// ── Update conversion ──────────────────────────────────────────────────

/// What the bridge should do with one update.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    /// Admin command. `username` is empty when the sender has none.
    Command {
        chat_id: ChatId,
        chat_kind: ChatKind,
        title: Option<String>,
        username: String,
        text: String,
    },
    Chat(InboundMessage),
}

fn chat_kind(chat_type: &str) -> Option<ChatKind> {
    match chat_type {
        "group" | "supergroup" => Some(ChatKind::Group),
        "private" => Some(ChatKind::Direct),
        _ => None,
    }
}

/// Classify a Telegram message. Bots, channels, non-text messages and
/// commands aimed at another bot (`/pause@OtherBot`) → `None`.
pub fn classify(msg: &TgMessage, me: &BotIdentity) -> Option<Incoming> {
    let user = msg.from.as_ref()?;
    if user.is_bot {
        return None;
    }
    let text = msg.text.as_deref().filter(|t| !t.trim().is_empty())?;
    let kind = chat_kind(&msg.chat.chat_type)?;

    if let Some(command) = split_command(text) {
        if !command.is_for(&me.username) {
            debug!("[telegram] Skipping /{} meant for @{}", command.name, command.target.unwrap_or_default());
            return None;
        }
        return Some(Incoming::Command {
            chat_id: msg.chat.id,
            chat_kind: kind,
            title: msg.chat.title.clone(),
            username: user.username.clone().unwrap_or_default(),
            text: text.to_string(),
        });
    }

    let sender = match &user.username {
        Some(u) => format!("@{u}"),
        None => user.first_name.clone(),
    };
    let is_reply_to_self = msg
        .reply_to_message
        .as_ref()
        .and_then(|r| r.from.as_ref())
        .map(|u| u.id == me.id)
        .unwrap_or(false);

    Some(Incoming::Chat(InboundMessage {
        chat_id: msg.chat.id,
        chat_kind: kind,
        chat_title: msg.chat.title.clone(),
        sender,
        text: text.to_string(),
        is_reply_to_self,
    }))
}

// ── API Helpers ────────────────────────────────────────────────────────

const TG_API: &str = "https://api.telegram.org/bot";

// Request URLs embed the bot token; keep it out of error text.
fn without_url(e: reqwest::Error) -> EngineError {
    EngineError::Network(e.without_url())
}

async fn tg_get_me(client: &reqwest::Client, token: &str) -> EngineResult<BotIdentity> {
    let url = format!("{}{}/getMe", TG_API, token);
    let resp: TgResponse<TgUser> = client
        .get(&url)
        .send()
        .await
        .map_err(without_url)?
        .json()
        .await
        .map_err(without_url)?;

    if !resp.ok {
        return Err(EngineError::Auth(format!(
            "getMe failed: {}",
            resp.description.unwrap_or_default()
        )));
    }
    let me = resp.result.ok_or("getMe: no result")?;
    Ok(BotIdentity { id: me.id, username: me.username.unwrap_or(me.first_name) })
}

async fn tg_get_updates(
    client: &reqwest::Client,
    token: &str,
    offset: i64,
    timeout: u64,
) -> EngineResult<Vec<TgUpdate>> {
    let url = format!(
        "{}{}/getUpdates?offset={}&timeout={}&allowed_updates=[\"message\"]",
        TG_API, token, offset, timeout
    );
    let resp: TgResponse<Vec<TgUpdate>> = client
        .get(&url)
        .timeout(std::time::Duration::from_secs(timeout + 10))
        .send()
        .await
        .map_err(without_url)?
        .json()
        .await
        .map_err(without_url)?;

    if !resp.ok {
        return Err(EngineError::channel(
            "telegram",
            format!("getUpdates error: {}", resp.description.unwrap_or_default()),
        ));
    }
    Ok(resp.result.unwrap_or_default())
}

/// sendMessage body. Plain text unless `markdown` is set.
fn send_body(chat_id: i64, text: &str, markdown: bool) -> serde_json::Value {
    let mut body = serde_json::json!({ "chat_id": chat_id, "text": text });
    if markdown {
        body["parse_mode"] = serde_json::json!("Markdown");
    }
    body
}

async fn tg_send_message(
    client: &reqwest::Client,
    token: &str,
    chat_id: i64,
    text: &str,
    markdown: bool,
) -> EngineResult<()> {
    let url = format!("{}{}/sendMessage", TG_API, token);
    for chunk in channels::split_message(text, TELEGRAM_CHUNK_LIMIT) {
        let resp = client
            .post(&url)
            .json(&send_body(chat_id, &chunk, markdown))
            .send()
            .await
            .map_err(without_url)?;
        if resp.status().is_success() {
            continue;
        }

        // Rejected Markdown (e.g. a group title with an odd `_`): resend plain.
        let retry = if markdown {
            client
                .post(&url)
                .json(&send_body(chat_id, &chunk, false))
                .send()
                .await
                .map_err(without_url)?
        } else {
            resp
        };
        if !retry.status().is_success() {
            let status = retry.status().as_u16();
            let body = retry.text().await.unwrap_or_default();
            return Err(EngineError::channel(
                "telegram",
                format!("sendMessage {}: {}", status, channels::truncate_utf8(&body, 200)),
            ));
        }
    }
    Ok(())
}

// ── Outbound transport ─────────────────────────────────────────────────

pub struct TelegramTransport {
    client: reqwest::Client,
    token: String,
}

impl TelegramTransport {
    pub fn new(token: &str) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(TelegramTransport { client, token: token.to_string() })
    }

    /// Markdown-formatted send, for the bot's own status report only.
    pub async fn send_markdown(&self, chat_id: ChatId, text: &str) -> EngineResult<()> {
        tg_send_message(&self.client, &self.token, chat_id, text, true).await
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(&self, chat_id: ChatId, text: &str) -> EngineResult<()> {
        tg_send_message(&self.client, &self.token, chat_id, text, false).await
    }
}

// ── Bridge Core ────────────────────────────────────────────────────────

pub struct TelegramBridge {
    transport: Arc<TelegramTransport>,
    engine: Arc<ChatEngine>,
    admin: Arc<AdminControlPlane>,
    stop: Arc<AtomicBool>,
}

impl TelegramBridge {
    pub fn new(
        transport: Arc<TelegramTransport>,
        engine: Arc<ChatEngine>,
        admin: Arc<AdminControlPlane>,
    ) -> Self {
        TelegramBridge { transport, engine, admin, stop: Arc::new(AtomicBool::new(false)) }
    }

    /// Flag checked between polls; set it to end `run`.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Connect and poll until stopped, reconnecting with backoff on error.
    pub async fn run(&self) {
        let mut reconnect_attempt: u32 = 0;
        while !self.stopped() {
            match self.run_polling_loop(&mut reconnect_attempt).await {
                Ok(()) => break,
                Err(e) => {
                    if self.stopped() {
                        break;
                    }
                    error!("[telegram] Bridge error: {}", e);
                    let delay = crate::engine::http::reconnect_delay(reconnect_attempt).await;
                    warn!(
                        "[telegram] Reconnected after {}ms (attempt {})",
                        delay.as_millis(),
                        reconnect_attempt + 1
                    );
                    reconnect_attempt = reconnect_attempt.saturating_add(1);
                }
            }
        }
        info!("[telegram] Bridge stopped");
    }

    async fn run_polling_loop(&self, reconnect_attempt: &mut u32) -> EngineResult<()> {
        let client = &self.transport.client;
        let token = &self.transport.token;

        let me = tg_get_me(client, token).await?;
        info!("[telegram] Connected as @{} ({})", me.username, me.id);
        self.engine.set_handle(&me.username);
        *reconnect_attempt = 0;

        let mut offset: i64 = 0;
        let mut poll_failures: u32 = 0;
        loop {
            if self.stopped() {
                info!("[telegram] Stop signal received, exiting poll loop");
                return Ok(());
            }

            let updates = match tg_get_updates(client, token, offset, TELEGRAM_POLL_TIMEOUT_SECS).await {
                Ok(u) => {
                    poll_failures = 0;
                    u
                }
                Err(e) => {
                    let delay = crate::engine::http::reconnect_delay(poll_failures).await;
                    warn!("[telegram] Poll error: {} (retried after {}ms)", e, delay.as_millis());
                    poll_failures = poll_failures.saturating_add(1);
                    continue;
                }
            };

            for update in updates {
                offset = update.update_id + 1;
                let Some(msg) = update.message else { continue };
                match classify(&msg, &me) {
                    Some(Incoming::Command { chat_id, chat_kind, title, username, text }) => {
                        self.on_command(chat_id, chat_kind, title, &username, &text).await;
                    }
                    Some(Incoming::Chat(inbound)) => self.on_message(&inbound),
                    None => {}
                }
            }
        }
    }

    async fn on_command(
        &self,
        chat_id: ChatId,
        chat_kind: ChatKind,
        title: Option<String>,
        username: &str,
        text: &str,
    ) {
        if chat_kind == ChatKind::Group {
            let title = title.unwrap_or_else(|| format!("chat {chat_id}"));
            self.engine.store().register(chat_id, &title);
        }
        debug!("[telegram] Command from @{} in {}: {}", username, chat_id, text);
        let ctx = CommandContext { chat_id, chat_kind, sender: username };
        if let Some(reply) = self.admin.handle_command(&ctx, text).await {
            let is_report = split_command(text).is_some_and(|c| c.name == "status");
            let sent = if is_report {
                self.transport.send_markdown(chat_id, &reply).await
            } else {
                self.transport.send(chat_id, &reply).await
            };
            if let Err(e) = sent {
                warn!("[telegram] Command reply to {} failed: {}", chat_id, e);
            }
        }
    }

    fn on_message(&self, inbound: &InboundMessage) {
        if let Observation::Fire(batch) = self.engine.observe(inbound) {
            let dispatcher = self.engine.dispatcher().clone();
            tokio::spawn(async move {
                dispatcher.fire(batch).await;
            });
        }
    }
}

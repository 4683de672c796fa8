// Mdm Teo — Admin Control Plane
//
// Privileged operations over the chat store, plus the chat-command surface
// that maps `/status`, `/sleep`, `/wake`, `/mood` and `/send` onto them.
//
// Authorization is a fixed allowlist of sender handles. Unauthorized callers
// are ignored, except `/sleep` which answers with a fixed rejection. Bad
// arguments get a usage hint and mutate nothing.

use crate::atoms::constants::{
    REPLY_NOT_ADMIN, REPLY_NO_GROUPS, REPLY_PM_ONLY, REPLY_SLEEP_HERE, REPLY_WAKE_HERE,
    USAGE_MOOD, USAGE_SEND, USAGE_SLEEP, USAGE_WAKE,
};
use crate::atoms::error::EngineResult;
use crate::engine::channels::is_admin;
use crate::engine::dispatcher::BatchDispatcher;
use log::{info, warn};
use mdmteo_core::{ChatId, ChatKind, ChatStatus, ChatStore, CoreError, CoreResult, Mood};
use std::fmt::Write;
use std::sync::Arc;

/// Who issued a command, and from where.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub sender: &'a str,
}

/// One parsed `/name@bot args` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Lowercased command word.
    pub name: String,
    /// The `@bot` suffix, if any.
    pub target: Option<&'a str>,
    pub args: &'a str,
}

impl ParsedCommand<'_> {
    /// Unsuffixed commands are for everyone; suffixed ones only for `handle`.
    pub fn is_for(&self, handle: &str) -> bool {
        match self.target {
            None => true,
            Some(t) => t.eq_ignore_ascii_case(handle.trim().trim_start_matches('@')),
        }
    }
}

/// Split `/name@bot rest` apart. `None` if not a command.
pub fn split_command(text: &str) -> Option<ParsedCommand<'_>> {
    let body = text.trim_start().strip_prefix('/')?;
    let (word, args) = match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], body[i..].trim()),
        None => (body, ""),
    };
    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target).filter(|t| !t.is_empty())),
        None => (word, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand { name: name.to_lowercase(), target, args })
}

pub fn parse_chat_id(arg: &str) -> CoreResult<ChatId> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(CoreError::MissingArgument("group_id"));
    }
    arg.parse::<ChatId>()
        .map_err(|_| CoreError::InvalidChatId(arg.to_string()))
}

/// `<id> <rest…>` → (id, rest). `rest` may be empty.
fn split_id_arg(args: &str) -> CoreResult<(ChatId, &str)> {
    let args = args.trim();
    let (head, tail) = match args.find(char::is_whitespace) {
        Some(i) => (&args[..i], args[i..].trim()),
        None => (args, ""),
    };
    Ok((parse_chat_id(head)?, tail))
}

pub struct AdminControlPlane {
    store: Arc<ChatStore>,
    dispatcher: Arc<BatchDispatcher>,
    admins: Vec<String>,
}

impl AdminControlPlane {
    pub fn new(store: Arc<ChatStore>, dispatcher: Arc<BatchDispatcher>, admins: Vec<String>) -> Self {
        AdminControlPlane { store, dispatcher, admins }
    }

    pub fn is_authorized(&self, sender: &str) -> bool {
        is_admin(&self.admins, sender)
    }

    // ── Operations ─────────────────────────────────────────────────────

    pub fn status(&self) -> Vec<ChatStatus> {
        self.store.status()
    }

    pub fn pause(&self, chat_id: ChatId) -> bool {
        info!("[admin] Pause chat {}", chat_id);
        self.store.pause(chat_id)
    }

    pub fn resume(&self, chat_id: ChatId) -> bool {
        info!("[admin] Resume chat {}", chat_id);
        self.store.resume(chat_id)
    }

    pub fn set_mood(&self, chat_id: ChatId, mood: Mood) -> Option<u32> {
        info!("[admin] Chat {} mood → {}", chat_id, mood);
        self.store.set_mood(chat_id, mood)
    }

    /// Verbatim send. Ignores pause state and leaves the buffer alone.
    pub async fn force_send(&self, chat_id: ChatId, text: &str) -> EngineResult<()> {
        self.dispatcher.force_send(chat_id, text).await
    }

    pub fn status_report(&self) -> String {
        let rows = self.status();
        if rows.is_empty() {
            return REPLY_NO_GROUPS.to_string();
        }
        let mut msg = String::from("📊 *Mdm Teo's Status Report:*\n\n");
        for row in rows {
            let state = if row.paused { "💤 ASLEEP" } else { "🟢 AWAKE" };
            let progress = match row.progress {
                Some((counter, threshold)) => format!("{counter}/{threshold}"),
                None => "-/-".to_string(),
            };
            let _ = write!(
                msg,
                "*{}*\nStatus: {}\nMood: {}\nChatter: {}\nID: `{}`\n\n",
                row.title, state, row.mood, progress, row.chat_id
            );
        }
        msg.push_str(
            "To sleep a group: `/sleep -10012345`\nTo wake a group: `/wake -10012345`\n\
             To change mood: `/mood -10012345 angry`",
        );
        msg
    }

    // ── Command surface ────────────────────────────────────────────────

    /// Handle a chat command. Returns the reply for the issuing chat, if any.
    pub async fn handle_command(&self, ctx: &CommandContext<'_>, text: &str) -> Option<String> {
        let ParsedCommand { name, args, .. } = split_command(text)?;
        let authorized = self.is_authorized(ctx.sender);
        let private = ctx.chat_kind == ChatKind::Direct;

        if !authorized {
            if matches!(name.as_str(), "status" | "sleep" | "pause" | "wake" | "resume" | "mood" | "send") {
                warn!("[admin] Ignored /{} from non-admin {}", name, ctx.sender);
            }
            return match name.as_str() {
                "sleep" | "pause" => Some(REPLY_NOT_ADMIN.to_string()),
                _ => None,
            };
        }

        match name.as_str() {
            "status" => {
                if !private {
                    return Some(REPLY_PM_ONLY.to_string());
                }
                Some(self.status_report())
            }
            "sleep" | "pause" => Some(self.toggle(ctx, args, true)),
            "wake" | "resume" => Some(self.toggle(ctx, args, false)),
            "mood" => {
                if !private {
                    return Some(REPLY_PM_ONLY.to_string());
                }
                let parsed = split_id_arg(args)
                    .and_then(|(id, mood)| Ok((id, mood.parse::<Mood>()?)));
                match parsed {
                    Ok((id, mood)) => Some(match self.set_mood(id, mood) {
                        Some(threshold) => format!(
                            "Done. Group {id} is now {mood}. I talk again after {threshold} messages."
                        ),
                        None => format!("Done. Group {id} is now {mood}."),
                    }),
                    Err(_) => Some(USAGE_MOOD.to_string()),
                }
            }
            "send" => {
                if !private {
                    return Some(REPLY_PM_ONLY.to_string());
                }
                match split_id_arg(args) {
                    Ok((id, body)) if !body.is_empty() => match self.force_send(id, body).await {
                        Ok(()) => Some(format!("Sent to {id}.")),
                        Err(e) => Some(format!("Cannot send leh: {e}")),
                    },
                    _ => Some(USAGE_SEND.to_string()),
                }
            }
            _ => None,
        }
    }

    /// `/sleep` and `/wake`. In a group with no argument the group itself is
    /// the target; otherwise the argument must be a chat id.
    fn toggle(&self, ctx: &CommandContext<'_>, args: &str, pause: bool) -> String {
        if ctx.chat_kind == ChatKind::Group && args.trim().is_empty() {
            if pause {
                self.pause(ctx.chat_id);
                return REPLY_SLEEP_HERE.to_string();
            }
            self.resume(ctx.chat_id);
            return REPLY_WAKE_HERE.to_string();
        }
        match parse_chat_id(args) {
            Ok(id) if pause => {
                self.pause(id);
                format!("Done. Group {id} is now muted.")
            }
            Ok(id) => {
                self.resume(id);
                format!("Done. Group {id} is active.")
            }
            Err(_) if pause => USAGE_SLEEP.to_string(),
            Err(_) => USAGE_WAKE.to_string(),
        }
    }
}

// ── Trigger Policy ─────────────────────────────────────────────────────────
// Decides whether a buffer fires, and holds the two text predicates that feed
// and filter that decision: direct-address detection on the way in and the
// silence sentinel on the way out.
//
// Both predicates match whole tokens, never raw substrings. Any occurrence of
// the handle or an alias still counts as an interrupt, even mid-sentence;
// that imprecision is accepted.

use crate::buffer::ConversationBuffer;
use crate::types::Decision;

/// Pure decision over a buffer that already includes the current message.
pub fn evaluate(buffer: &ConversationBuffer, is_direct_address: bool) -> Decision {
    if is_direct_address {
        Decision::FireInterrupt
    } else if buffer.counter() >= buffer.threshold() {
        Decision::FireOrdinary
    } else {
        Decision::NoFire
    }
}

/// Split on anything that is not a word character. `@` is dropped so that
/// `@handle` and `handle` compare equal.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

/// Detects messages that address the bot directly.
#[derive(Debug, Clone, Default)]
pub struct AddressDetector {
    handle: Option<String>,
    /// Each alias as a lowercase token sequence ("mdm teo" → ["mdm", "teo"]).
    aliases: Vec<Vec<String>>,
}

impl AddressDetector {
    pub fn new<S: AsRef<str>>(handle: Option<&str>, aliases: &[S]) -> Self {
        let handle = handle
            .map(|h| h.trim().trim_start_matches('@').to_lowercase())
            .filter(|h| !h.is_empty());
        let aliases = aliases
            .iter()
            .map(|a| tokens(a.as_ref()).map(str::to_lowercase).collect::<Vec<_>>())
            .filter(|seq| !seq.is_empty())
            .collect();
        AddressDetector { handle, aliases }
    }

    /// Install the bot's own handle once the transport has learned it.
    pub fn with_handle(mut self, handle: &str) -> Self {
        let h = handle.trim().trim_start_matches('@').to_lowercase();
        self.handle = if h.is_empty() { None } else { Some(h) };
        self
    }

    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn is_direct_address(&self, text: &str, is_reply_to_self: bool) -> bool {
        if is_reply_to_self {
            return true;
        }
        let words: Vec<String> = tokens(text).map(str::to_lowercase).collect();
        if let Some(handle) = &self.handle {
            if words.iter().any(|w| w == handle) {
                return true;
            }
        }
        self.aliases.iter().any(|alias| {
            words
                .windows(alias.len())
                .any(|window| window.iter().zip(alias).all(|(w, a)| w == a))
        })
    }
}

/// Reserved token the model uses to say "no visible reply".
#[derive(Debug, Clone)]
pub struct SilenceSentinel {
    token: String,
}

impl SilenceSentinel {
    pub fn new(token: impl Into<String>) -> Self {
        SilenceSentinel { token: token.into() }
    }

    /// True when the sentinel appears as a whole, case-exact token.
    pub fn is_silence(&self, response: &str) -> bool {
        let trimmed = response.trim();
        trimmed == self.token || tokens(trimmed).any(|t| t == self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(counter: u32, threshold: u32) -> ConversationBuffer {
        let mut b = ConversationBuffer::new(threshold);
        for i in 0..counter {
            b.append(format!("u: {i}"));
        }
        b
    }

    #[test]
    fn ordinary_fires_at_threshold() {
        assert_eq!(evaluate(&buffer(4, 5), false), Decision::NoFire);
        assert_eq!(evaluate(&buffer(5, 5), false), Decision::FireOrdinary);
        assert_eq!(evaluate(&buffer(6, 5), false), Decision::FireOrdinary);
    }

    #[test]
    fn direct_address_always_interrupts() {
        assert_eq!(evaluate(&buffer(0, 50), true), Decision::FireInterrupt);
        assert_eq!(evaluate(&buffer(1, 50), true), Decision::FireInterrupt);
        assert_eq!(evaluate(&buffer(50, 50), true), Decision::FireInterrupt);
    }

    #[test]
    fn handle_matches_as_token() {
        let d = AddressDetector::new(Some("@MdmTeoBot"), &["teo"]);
        assert!(d.is_direct_address("eh @mdmteobot you there", false));
        assert!(d.is_direct_address("MdmTeoBot?", false));
        assert!(!d.is_direct_address("mdmteobotx is a different bot", false));
    }

    #[test]
    fn alias_matches_whole_words_only() {
        let d = AddressDetector::new(None, &["teo"]);
        assert!(d.is_direct_address("Teo, what you think", false));
        assert!(d.is_direct_address("ask ah teo lah", false));
        assert!(!d.is_direct_address("teochew porridge later", false));
    }

    #[test]
    fn multi_word_alias() {
        let d = AddressDetector::new(None, &["mdm teo"]);
        assert!(d.is_direct_address("hello Mdm Teo!", false));
        assert!(!d.is_direct_address("mdm tan and teo", false));
    }

    #[test]
    fn reply_to_self_is_direct() {
        let d = AddressDetector::default();
        assert!(d.is_direct_address("ok", true));
        assert!(!d.is_direct_address("ok", false));
    }

    #[test]
    fn with_handle_replaces_handle() {
        let d = AddressDetector::new::<&str>(None, &[]).with_handle("@TeoBot");
        assert_eq!(d.handle(), Some("teobot"));
        assert!(d.is_direct_address("teobot say something", false));
    }

    #[test]
    fn sentinel_exact_token() {
        let s = SilenceSentinel::new("IGNORE");
        assert!(s.is_silence("IGNORE"));
        assert!(s.is_silence("  IGNORE.\n"));
        assert!(s.is_silence("hmm... IGNORE"));
        assert!(!s.is_silence("Aiyo don't ignore your grandma"));
        assert!(!s.is_silence("IGNORED you all day"));
    }
}

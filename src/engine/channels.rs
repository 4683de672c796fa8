// Mdm Teo — Shared Channel Helpers
//
// Small text and access helpers used by the Telegram bridge and the admin
// control plane:
//   - split_message()  — splits long replies for platform message limits
//   - truncate_utf8()  — log-safe truncation on a char boundary
//   - is_admin()       — allowlist check on sender handles

/// Largest byte index `<= max` that falls on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Truncate to at most `max_bytes` without splitting a character.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    &s[..floor_char_boundary(s, max_bytes)]
}

/// Split a long message into chunks at a given limit, preferring newline/space breaks.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }
        let mut limit = floor_char_boundary(remaining, max_len);
        if limit == 0 {
            // A single character wider than max_len still has to go somewhere.
            limit = remaining.chars().next().map(char::len_utf8).unwrap_or(remaining.len());
        }
        let head = &remaining[..limit];
        let split_at = head
            .rfind('\n')
            .or_else(|| head.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }
    chunks
}

/// Normalise a handle for comparison: no leading `@`, lowercase.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

/// Allowlist check. Handles compare case-insensitively, with or without `@`.
pub fn is_admin(allowed: &[String], handle: &str) -> bool {
    let wanted = normalize_handle(handle);
    !wanted.is_empty() && allowed.iter().any(|a| normalize_handle(a) == wanted)
}

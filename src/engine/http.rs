// ── Mdm Teo: Bridge Reconnect Backoff ─────────────────────────────────────
//
// Escalating backoff for the Telegram polling loop after a failed
// getUpdates call. Exponential from 1s, capped at 5 minutes, ±25% jitter.

use rand::Rng;
use std::time::Duration;

// ── Constants ──────────────────────────────────────────────────────────────

/// Initial reconnect delay in milliseconds (doubles each attempt).
const INITIAL_RECONNECT_DELAY_MS: u64 = 1_000;

/// Maximum reconnect delay cap in milliseconds (5 minutes).
const MAX_RECONNECT_DELAY_MS: u64 = 300_000;

/// Floor applied after jitter.
const MIN_DELAY_MS: u64 = 100;

// ── Backoff delay ──────────────────────────────────────────────────────────

/// Un-jittered backoff for a 0-based attempt.
pub fn reconnect_backoff_ms(attempt: u32) -> u64 {
    let base_ms = INITIAL_RECONNECT_DELAY_MS * 2u64.pow(attempt.min(12));
    base_ms.min(MAX_RECONNECT_DELAY_MS)
}

/// Sleep for the jittered backoff of `attempt` and return the delay used.
pub async fn reconnect_delay(attempt: u32) -> Duration {
    let delay = Duration::from_millis(apply_jitter(reconnect_backoff_ms(attempt)));
    tokio::time::sleep(delay).await;
    delay
}

/// Apply ±25% jitter to prevent thundering-herd effects.
fn apply_jitter(base_ms: u64) -> u64 {
    let jitter_range = (base_ms / 4) as i64;
    if jitter_range == 0 {
        return base_ms.max(MIN_DELAY_MS);
    }
    let offset = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
    (base_ms as i64 + offset).max(MIN_DELAY_MS as i64) as u64
}

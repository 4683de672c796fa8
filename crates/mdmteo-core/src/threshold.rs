// ── Threshold Sources ──────────────────────────────────────────────────────
// The randomness behind "how many messages until the next batch" is injected
// so tests can script exact fire points.

use crate::types::Mood;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

pub trait ThresholdSource: Send + Sync {
    /// Draw the next threshold for a chat in the given mood.
    fn next_threshold(&self, mood: Mood) -> u32;
}

/// Uniform draw from the mood's range.
pub struct RandomThresholds {
    rng: Mutex<StdRng>,
}

impl RandomThresholds {
    pub fn from_entropy() -> Self {
        RandomThresholds { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomThresholds { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl ThresholdSource for RandomThresholds {
    fn next_threshold(&self, mood: Mood) -> u32 {
        self.rng.lock().gen_range(mood.threshold_range())
    }
}

/// Replays a fixed queue of thresholds, then falls back to the low end of
/// the mood's range once the queue is exhausted.
pub struct ScriptedThresholds {
    queue: Mutex<VecDeque<u32>>,
}

impl ScriptedThresholds {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        ScriptedThresholds { queue: Mutex::new(values.into_iter().collect()) }
    }

    pub fn push(&self, value: u32) {
        self.queue.lock().push_back(value);
    }
}

impl ThresholdSource for ScriptedThresholds {
    fn next_threshold(&self, mood: Mood) -> u32 {
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| *mood.threshold_range().start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_draws_stay_in_range() {
        let src = RandomThresholds::seeded(7);
        for mood in Mood::ALL {
            let range = mood.threshold_range();
            for _ in 0..500 {
                assert!(range.contains(&src.next_threshold(mood)));
            }
        }
    }

    #[test]
    fn seeded_sources_agree() {
        let a = RandomThresholds::seeded(42);
        let b = RandomThresholds::seeded(42);
        let xs: Vec<u32> = (0..20).map(|_| a.next_threshold(Mood::Chill)).collect();
        let ys: Vec<u32> = (0..20).map(|_| b.next_threshold(Mood::Chill)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn scripted_replays_then_falls_back() {
        let src = ScriptedThresholds::new([5, 9]);
        assert_eq!(src.next_threshold(Mood::Normal), 5);
        assert_eq!(src.next_threshold(Mood::Normal), 9);
        assert_eq!(src.next_threshold(Mood::Angry), 2);
        src.push(33);
        assert_eq!(src.next_threshold(Mood::Normal), 33);
    }
}

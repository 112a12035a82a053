use tinyrand::{Rand, RandRange, Seeded, StdRand};
use tinyrand_std::ClockSeed;

use crate::constants::{
    RETRY_INITIAL_DELAY_MS, RETRY_JITTER_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
    RETRY_MULTIPLIER,
};

/// Capped exponential backoff: `delay(n) = min(initial * multiplier^n, max)`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial_ms: u64,
    pub multiplier: u64,
    pub max_ms: u64,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_ms: RETRY_INITIAL_DELAY_MS,
            multiplier: RETRY_MULTIPLIER,
            max_ms: RETRY_MAX_DELAY_MS,
            max_attempts: RETRY_MAX_ATTEMPTS,
        }
    }
}

impl Backoff {
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        self.initial_ms
            .saturating_mul(self.multiplier.saturating_pow(attempt))
            .min(self.max_ms)
    }

    /// Base delay plus a small random offset so a burst of failed batches
    /// doesn't retry in lockstep.
    pub fn jittered_delay_ms(&self, attempt: u32) -> u64 {
        let mut rand = StdRand::seed(ClockSeed::default().next_u64());
        self.delay_ms(attempt) + rand.next_range(0..RETRY_JITTER_MS)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_delay_sequence() {
        let backoff = Backoff {
            initial_ms: 1000,
            multiplier: 2,
            max_ms: 10_000,
            max_attempts: 5,
        };

        let delays: Vec<u64> = (0..backoff.max_attempts)
            .map(|n| backoff.delay_ms(n))
            .collect();

        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000]);
    }

    #[test]
    fn test_delay_stays_capped() {
        let backoff = Backoff::default();

        for attempt in 0..64 {
            assert!(backoff.delay_ms(attempt) <= backoff.max_ms);
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let backoff = Backoff::default();

        for attempt in 0..backoff.max_attempts {
            let base = backoff.delay_ms(attempt);
            let jittered = backoff.jittered_delay_ms(attempt);

            assert!(jittered >= base);
            assert!(jittered < base + RETRY_JITTER_MS);
        }
    }
}

//! Pre-attempt exponential backoff with jitter (§4.3): `seed × 2^(attempt-1)`
//! with ±20%.

use rand::Rng;
use std::time::Duration;

/// `attempt` is 1-indexed: the delay before the *next* attempt after
/// `attempt` has already failed.
pub fn backoff_duration(seed_ms: u64, attempt: u32) -> Duration {
    let base = seed_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(32));
    let jitter_fraction = rand::rng().random_range(-0.2..=0.2);
    let jittered = (base as f64) * (1.0 + jitter_fraction);
    Duration::from_millis(jittered.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_per_attempt_within_jitter_bounds() {
        for attempt in 1..=5 {
            let delay = backoff_duration(200, attempt).as_millis() as f64;
            let base = 200.0 * 2f64.powi(attempt as i32 - 1);
            assert!(delay >= base * 0.8 - 1.0 && delay <= base * 1.2 + 1.0, "attempt {attempt}: {delay} vs base {base}");
        }
    }
}

//! Exponential backoff with jitter between dial attempts.

use std::time::Duration;
use rand::Rng;

/// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped
/// at `cap`, plus up to 10% jitter that never pushes it past the cap.
///
/// Retry 0 and a zero base both yield no delay.
pub fn calculate_backoff(retry: u32, base: Duration, cap: Duration) -> Duration {
    if retry == 0 || base.is_zero() {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow((retry - 1).min(31));
    let delay = base.checked_mul(factor).unwrap_or(cap).min(cap);

    let jitter_ms = delay.as_millis() as u64 / 10;
    if jitter_ms == 0 {
        return delay;
    }
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms));
    (delay + jitter).min(cap)
}

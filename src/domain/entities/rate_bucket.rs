use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token bucket parameters: `rate` requests per `per` window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleLimits {
    pub rate: f64,
    pub per: Duration,
}

impl ThrottleLimits {
    pub fn new(rate: f64, per: Duration) -> Self {
        Self { rate, per }
    }
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        Self {
            rate: 10.0,
            per: Duration::from_secs(10),
        }
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Denied,
}

/// Per-client token bucket.
///
/// Persisted as the compact tuple `[allowance, last_check, throttle_count]`,
/// with `last_check` in fractional Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, u64)", into = "(f64, f64, u64)")]
pub struct RateBucket {
    allowance: f64,
    last_check: f64,
    throttle_count: u64,
}

impl RateBucket {
    /// New bucket with a full allowance
    pub fn fresh(limits: &ThrottleLimits, now: f64) -> Self {
        Self {
            allowance: limits.rate,
            last_check: now,
            throttle_count: 0,
        }
    }

    /// Reconstruct from storage
    pub fn reconstruct(allowance: f64, last_check: f64, throttle_count: u64) -> Self {
        Self {
            allowance,
            last_check,
            throttle_count,
        }
    }

    /// Run one admission check at `now`, updating the bucket in place.
    ///
    /// A window that has fully elapsed refills the allowance to `rate`.
    /// Inside the window, a request is denied once the allowance drops
    /// below one. `last_check` moves to `now` either way.
    pub fn check(&mut self, limits: &ThrottleLimits, now: f64) -> Admission {
        let per = limits.per.as_secs_f64();
        let elapsed = now - self.last_check;
        self.last_check = now;

        if elapsed < per && self.allowance < 1.0 {
            self.throttle_count += 1;
            return Admission::Denied;
        }

        if elapsed > per {
            self.allowance = limits.rate;
        }

        self.allowance -= 1.0;
        Admission::Admitted
    }

    /// True once a whole window has passed since the last check, so the
    /// next check would refill the allowance anyway.
    pub fn is_expired(&self, limits: &ThrottleLimits, now: f64) -> bool {
        now - self.last_check > limits.per.as_secs_f64()
    }

    // Getters
    pub fn allowance(&self) -> f64 {
        self.allowance
    }

    pub fn last_check(&self) -> f64 {
        self.last_check
    }

    pub fn throttle_count(&self) -> u64 {
        self.throttle_count
    }
}

impl From<(f64, f64, u64)> for RateBucket {
    fn from((allowance, last_check, throttle_count): (f64, f64, u64)) -> Self {
        Self::reconstruct(allowance, last_check, throttle_count)
    }
}

impl From<RateBucket> for (f64, f64, u64) {
    fn from(bucket: RateBucket) -> Self {
        (bucket.allowance, bucket.last_check, bucket.throttle_count)
    }
}

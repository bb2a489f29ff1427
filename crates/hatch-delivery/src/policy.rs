// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy and provider status classification.

use std::time::Duration;

use hatch_config::model::DeliveryConfig;

/// How many times to try and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before retry number `retry` (1 for the second attempt).
    ///
    /// `base * 2^(retry - 1)`, capped at `max_backoff`. Non-decreasing in `retry`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_backoff
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(2000),
        }
    }
}

/// What a provider status code means for the current send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The provider accepted the message.
    Delivered,
    /// Transient; try again if attempts remain.
    Retryable(&'static str),
    /// Permanent; stop now.
    Terminal(String),
}

/// Classify a provider response status.
///
/// Only 200 counts as delivered. Statuses outside the known set are
/// terminal so an unfamiliar provider answer never triggers a resend.
pub fn classify(status: u16) -> Classification {
    match status {
        200 => Classification::Delivered,
        400 => Classification::Terminal("bad request".to_string()),
        401 => Classification::Terminal("unauthorized".to_string()),
        403 => Classification::Terminal("forbidden".to_string()),
        404 => Classification::Terminal("endpoint not found".to_string()),
        429 => Classification::Retryable("rate limited"),
        500 => Classification::Retryable("provider error"),
        other => Classification::Terminal(format!("unexpected status {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(6), Duration::from_millis(2000));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_millis(2000));
    }

    #[test]
    fn backoff_is_non_decreasing() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_backoff: Duration::from_millis(7),
            max_backoff: Duration::from_millis(500),
        };
        let delays: Vec<_> = (1..40).map(|n| policy.backoff(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn config_zero_attempts_is_clamped() {
        let mut config = DeliveryConfig::default();
        config.max_attempts = 0;
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify(200), Classification::Delivered);
        for status in [400, 401, 403, 404] {
            assert!(matches!(classify(status), Classification::Terminal(_)), "{status}");
        }
        assert!(matches!(classify(429), Classification::Retryable(_)));
        assert!(matches!(classify(500), Classification::Retryable(_)));
    }

    #[test]
    fn unknown_statuses_are_terminal_and_unexpected() {
        for status in [201, 202, 302, 418, 502, 503] {
            match classify(status) {
                Classification::Terminal(reason) => {
                    assert_eq!(reason, format!("unexpected status {status}"))
                }
                other => panic!("{status} classified as {other:?}"),
            }
        }
    }
}

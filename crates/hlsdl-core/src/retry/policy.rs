use std::time::Duration;

/// Round-based retry policy: after the initial pass, up to `max_rounds`
/// retry rounds run; round `n` is preceded by a pause of `n * backoff_unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry rounds (not counting the initial pass).
    pub max_rounds: u32,
    /// Pause before round 1; round `n` waits `n` units.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Pause before retry round `round` (1-based). Round 0 (the initial pass) never waits.
    pub fn backoff(&self, round: u32) -> Duration {
        self.backoff_unit.saturating_mul(round)
    }

    /// True if another round may run after `round` (0 = initial pass).
    pub fn has_round_after(&self, round: u32) -> bool {
        round < self.max_rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::ZERO);
        assert_eq!(p.backoff(1), Duration::from_secs(1));
        assert_eq!(p.backoff(2), Duration::from_secs(2));
        assert_eq!(p.backoff(5), Duration::from_secs(5));
    }

    #[test]
    fn backoff_uses_unit() {
        let p = RetryPolicy {
            max_rounds: 3,
            backoff_unit: Duration::from_millis(10),
        };
        assert_eq!(p.backoff(3), Duration::from_millis(30));
    }

    #[test]
    fn respects_max_rounds() {
        let p = RetryPolicy {
            max_rounds: 2,
            backoff_unit: Duration::ZERO,
        };
        assert!(p.has_round_after(0));
        assert!(p.has_round_after(1));
        assert!(!p.has_round_after(2));

        let none = RetryPolicy {
            max_rounds: 0,
            ..p
        };
        assert!(!none.has_round_after(0));
    }
}

use crate::retry::RetryPolicy;

/// Where the acquisition state machine stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First pass over every segment.
    Initial,
    /// Retry round `n` (1-based) over the previous round's failures.
    Retry(u32),
    /// No more rounds: all slots filled or retries exhausted.
    Settled,
}

impl Phase {
    /// Round number to run (0 for the initial pass), or `None` once settled.
    pub fn round(&self) -> Option<u32> {
        match self {
            Phase::Initial => Some(0),
            Phase::Retry(n) => Some(*n),
            Phase::Settled => None,
        }
    }

    /// Next phase after the current one completed.
    pub fn advance(self, all_filled: bool, policy: &RetryPolicy) -> Phase {
        match self.round() {
            Some(round) if !all_filled && policy.has_round_after(round) => Phase::Retry(round + 1),
            _ => Phase::Settled,
        }
    }
}

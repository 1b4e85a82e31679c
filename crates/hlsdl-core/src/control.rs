//! Cooperative cancellation for a pipeline run.
//!
//! The CLI holds one `AbortToken` per run and raises it on Ctrl-C. Workers
//! check it before starting each segment; the scheduler checks it between
//! phases and ends the run with `PipelineError::Aborted`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Segments already in flight finish; queued ones are skipped.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = AbortToken::new();
        let seen_by_worker = token.clone();
        assert!(!seen_by_worker.is_raised());
        token.raise();
        assert!(seen_by_worker.is_raised());
    }
}

//! Progress reporting for segment acquisition (advisory only).
//!
//! The scheduler sends a snapshot after every completed segment; consumers
//! derive rate and ETA from it.

/// Snapshot of acquisition progress (CLI-friendly).
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Segments stored and verified so far.
    pub segments_done: usize,
    /// Total number of segments.
    pub segment_count: usize,
    /// Bytes in completed segments.
    pub bytes_done: u64,
    /// Elapsed time since acquisition started (seconds).
    pub elapsed_secs: f64,
    /// Phase the snapshot was taken in (0 = initial pass).
    pub round: u32,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining, from the per-segment rate so far.
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.segment_count.saturating_sub(self.segments_done);
        if remaining == 0 {
            return Some(0.0);
        }
        if self.segments_done == 0 || self.elapsed_secs <= 0.0 {
            return None;
        }
        Some(self.elapsed_secs / self.segments_done as f64 * remaining as f64)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.segment_count == 0 {
            return 1.0;
        }
        (self.segments_done as f64 / self.segment_count as f64).min(1.0)
    }
}

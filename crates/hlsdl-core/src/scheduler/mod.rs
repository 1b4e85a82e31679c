//! Segment acquisition scheduler.
//!
//! Downloads every segment of a playlist into the staging directory under a
//! fixed concurrency cap, then re-runs the failures in retry rounds with a
//! growing pause in between. Each phase is a full barrier. Results land in a
//! slot per ordinal, so merge order never depends on completion order.
//!
//! Phases: `Initial → Retry(1) → … → Retry(max_retry) → Settled`.

mod phase;
mod pool;
mod progress;
mod slots;

pub use phase::Phase;
pub use progress::ProgressStats;
pub use slots::ResultSlots;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::RunConfig;
use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::fetch::{Fetch, FetchError};
use crate::retry::{classify, ErrorKind};
use crate::storage::{remove_if_exists, segment_path};
use crate::validate::{validate_ts, ValidationError};

/// One segment to download: its playlist position and absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTask {
    /// Zero-based position in the playlist; defines merge order.
    pub ordinal: usize,
    pub url: String,
}

/// Why a single attempt at a segment failed. Every variant is retried.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("download failed: {0}")]
    Download(#[from] FetchError),
    #[error("downloaded file is empty")]
    Empty,
    #[error("integrity check failed: {0}")]
    Invalid(#[source] ValidationError),
}

/// Counters for one acquisition run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquireSummary {
    /// Attempts started, across all phases.
    pub attempts: u32,
    /// Attempts that failed.
    pub failed_attempts: u32,
    /// Retry rounds that actually ran.
    pub retry_rounds: u32,
    /// Failures the server signalled as throttling (429/503).
    pub throttle_events: u32,
    /// Timeouts, connection errors and 5xx.
    pub error_events: u32,
}

impl AcquireSummary {
    fn record_failure(&mut self, kind: ErrorKind) {
        self.failed_attempts += 1;
        match kind {
            ErrorKind::Throttled => self.throttle_events += 1,
            ErrorKind::Timeout | ErrorKind::Connection | ErrorKind::Http5xx(_) => {
                self.error_events += 1
            }
            ErrorKind::BadContent | ErrorKind::Storage | ErrorKind::Other => {}
        }
    }
}

/// Verified staging files, in ordinal order.
#[derive(Debug)]
pub struct Acquired {
    pub files: Vec<PathBuf>,
    pub bytes: u64,
    pub summary: AcquireSummary,
}

/// Granularity of abort checks while waiting between retry rounds.
const ABORT_POLL: Duration = Duration::from_millis(50);

/// Sleep for `pause`, waking early when `abort` is raised. Returns false if aborted.
fn pause_unless_aborted(pause: Duration, abort: &AbortToken) -> bool {
    let deadline = Instant::now() + pause;
    loop {
        if abort.is_raised() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(ABORT_POLL));
    }
}

/// One attempt at one segment: fetch into its staging path, then reject
/// empty or (when enabled) structurally invalid files. A rejected file is
/// removed so the slot stays empty and the ordinal is retried.
pub(crate) fn attempt_segment<F: Fetch>(
    fetcher: &F,
    task: &SegmentTask,
    dest: &Path,
    validate: bool,
) -> Result<u64, SegmentError> {
    let bytes = fetcher.fetch_to_file(&task.url, dest)?;
    let checked = if bytes == 0 {
        Err(SegmentError::Empty)
    } else if validate {
        validate_ts(dest).map_err(SegmentError::Invalid)
    } else {
        Ok(())
    };
    if let Err(e) = checked {
        if let Err(rm) = remove_if_exists(dest) {
            tracing::warn!(path = %dest.display(), "could not remove rejected segment: {}", rm);
        }
        return Err(e);
    }
    Ok(bytes)
}

/// Download, retry and verify every task. `tasks[i].ordinal` must equal `i`.
///
/// Fails with `MissingSegment` (naming the lowest unresolved ordinal) when a
/// segment is still missing after the last retry round, and with
/// `SegmentEmpty` / `SegmentValidation` when a stored file fails the final
/// check. Progress is sent with `try_send` and may be dropped.
pub fn acquire<F: Fetch>(
    fetcher: &F,
    tasks: &[SegmentTask],
    run: &RunConfig,
    abort: &AbortToken,
    progress_tx: Option<&tokio::sync::mpsc::Sender<ProgressStats>>,
) -> Result<Acquired, PipelineError> {
    debug_assert!(tasks.iter().enumerate().all(|(i, t)| t.ordinal == i));
    let policy = run.retry_policy();
    let segment_count = tasks.len();
    let mut slots = ResultSlots::new(segment_count);
    let mut last_errors: Vec<Option<SegmentError>> = (0..segment_count).map(|_| None).collect();
    let mut summary = AcquireSummary::default();
    let mut bytes_done = 0u64;
    let started = Instant::now();

    tracing::info!(
        segments = segment_count,
        threads = run.threads,
        max_retry = policy.max_rounds,
        validate = run.validate,
        "starting segment acquisition"
    );

    let mut pending: Vec<usize> = (0..segment_count).collect();
    let mut phase = Phase::Initial;
    while let Some(round) = phase.round() {
        if round > 0 {
            let pause = policy.backoff(round);
            tracing::info!(
                round,
                max = policy.max_rounds,
                pending = pending.len(),
                ?pause,
                "retrying failed segments"
            );
            if !pause_unless_aborted(pause, abort) {
                return Err(PipelineError::Aborted);
            }
            summary.retry_rounds += 1;
        }
        if abort.is_raised() {
            return Err(PipelineError::Aborted);
        }

        pool::run_phase(
            pending.clone(),
            run.threads,
            abort,
            |ordinal| {
                let dest = segment_path(&run.staging_dir, ordinal);
                attempt_segment(fetcher, &tasks[ordinal], &dest, run.validate)
            },
            |ordinal, result| {
                summary.attempts += 1;
                match result {
                    Ok(bytes) => {
                        slots.fill(ordinal, segment_path(&run.staging_dir, ordinal));
                        last_errors[ordinal] = None;
                        bytes_done += bytes;
                        if round > 0 {
                            tracing::info!(ordinal, round, "segment recovered on retry");
                        }
                        if let Some(tx) = progress_tx {
                            let _ = tx.try_send(ProgressStats {
                                segments_done: slots.filled(),
                                segment_count,
                                bytes_done,
                                elapsed_secs: started.elapsed().as_secs_f64(),
                                round,
                            });
                        }
                    }
                    Err(e) => {
                        let kind = classify(&e);
                        summary.record_failure(kind);
                        tracing::warn!(
                            ordinal,
                            round,
                            kind = kind.as_str(),
                            url = %tasks[ordinal].url,
                            "segment attempt failed: {}",
                            e
                        );
                        last_errors[ordinal] = Some(e);
                    }
                }
            },
        );

        if abort.is_raised() {
            return Err(PipelineError::Aborted);
        }
        // Ordinals never reported back (attempt panicked, skipped) stay pending too.
        pending.retain(|&ordinal| !slots.is_filled(ordinal));
        phase = phase.advance(pending.is_empty(), &policy);
    }

    let files = match slots.into_files() {
        Ok(files) => files,
        Err(ordinal) => {
            tracing::error!(
                ordinal,
                unresolved = pending.len(),
                "segments still missing after all retry rounds"
            );
            return Err(PipelineError::MissingSegment {
                ordinal,
                url: tasks[ordinal].url.clone(),
                retries: policy.max_rounds,
                cause: last_errors[ordinal].take(),
            });
        }
    };
    verify_files(&files, run.validate)?;

    tracing::info!(
        segments = segment_count,
        bytes = bytes_done,
        attempts = summary.attempts,
        retry_rounds = summary.retry_rounds,
        "all segments downloaded"
    );
    Ok(Acquired {
        files,
        bytes: bytes_done,
        summary,
    })
}

/// Final check over the filled slots: every file must still exist, be
/// non-empty, and (when enabled) pass the integrity check.
pub fn verify_files(files: &[PathBuf], validate: bool) -> Result<(), PipelineError> {
    for (ordinal, path) in files.iter().enumerate() {
        let len = std::fs::metadata(path)
            .map_err(|e| PipelineError::SegmentValidation {
                ordinal,
                path: path.clone(),
                source: ValidationError::Io(e),
            })?
            .len();
        if len == 0 {
            return Err(PipelineError::SegmentEmpty {
                ordinal,
                path: path.clone(),
            });
        }
        if validate {
            validate_ts(path).map_err(|source| PipelineError::SegmentValidation {
                ordinal,
                path: path.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

//! One complete run: resolve the playlist, acquire every segment into the
//! staging directory, merge them into the output, clean up.

use std::path::PathBuf;
use std::time::Instant;

use crate::config::RunConfig;
use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::merge::merge_segments;
use crate::playlist::{self, ResolvedPlaylist};
use crate::scheduler::{self, AcquireSummary, ProgressStats};
use crate::storage::clear_staging;

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    /// Media playlist the segments came from.
    pub playlist_url: String,
    pub segments: usize,
    /// Size of the merged output.
    pub bytes: u64,
    pub elapsed_secs: f64,
    pub summary: AcquireSummary,
}

/// Download the playlist at `playlist_url` into `run.output`.
///
/// Staged segment files are removed whether the run succeeds or fails; the
/// output path is only written by a complete merge.
pub fn run<F: Fetch>(
    fetcher: &F,
    playlist_url: &str,
    run: &RunConfig,
    abort: &AbortToken,
    progress_tx: Option<&tokio::sync::mpsc::Sender<ProgressStats>>,
) -> Result<RunReport, PipelineError> {
    let started = Instant::now();
    let ResolvedPlaylist {
        playlist, tasks, ..
    } = playlist::resolve(fetcher, playlist_url)?;
    if abort.is_raised() {
        return Err(PipelineError::Aborted);
    }

    std::fs::create_dir_all(&run.staging_dir).map_err(|source| PipelineError::Staging {
        path: run.staging_dir.clone(),
        source,
    })?;

    let result = scheduler::acquire(fetcher, &tasks, run, abort, progress_tx).and_then(|acquired| {
        let bytes = merge_segments(&acquired.files, &run.output)?;
        Ok((bytes, acquired.summary))
    });
    clear_staging(&run.staging_dir, tasks.len());

    let (bytes, summary) = result?;
    let report = RunReport {
        output: run.output.clone(),
        playlist_url: playlist.url.to_string(),
        segments: tasks.len(),
        bytes,
        elapsed_secs: started.elapsed().as_secs_f64(),
        summary,
    };
    tracing::info!(
        output = %report.output.display(),
        segments = report.segments,
        bytes = report.bytes,
        elapsed_secs = report.elapsed_secs,
        "download complete"
    );
    Ok(report)
}

//! `hlsdl download` – resolve, fetch, verify and merge one playlist.

use anyhow::{Context, Result};
use hlsdl_core::config::{HlsdlConfig, RunConfig};
use hlsdl_core::scheduler::ProgressStats;
use hlsdl_core::{pipeline, AbortToken, CurlFetcher};
use std::io::Write;
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_download(url: &str, cfg: &HlsdlConfig) -> Result<()> {
    let run = RunConfig::from_config(cfg);
    let abort = AbortToken::new();

    let ctrl_c = {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; finishing in-flight segments");
                eprintln!("\ninterrupted, stopping after in-flight segments...");
                abort.raise();
            }
        })
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut printed = false;
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || stats.segments_done >= stats.segment_count
            {
                let eta = stats
                    .eta_secs()
                    .map(|s| format!("{:.0}s", s))
                    .unwrap_or_else(|| "?".to_string());
                eprint!(
                    "\r  {}/{} segments ({:.1}%)  {:.1} MiB  {:.2} MiB/s  ETA {}  ",
                    stats.segments_done,
                    stats.segment_count,
                    stats.fraction() * 100.0,
                    stats.bytes_done as f64 / 1_048_576.0,
                    stats.bytes_per_sec() / 1_048_576.0,
                    eta
                );
                let _ = std::io::stderr().flush();
                last_print = now;
                printed = true;
            }
        }
        if printed {
            eprintln!();
        }
    });

    let job_url = url.to_string();
    let job_run = run.clone();
    let job_abort = abort.clone();
    let result = tokio::task::spawn_blocking(move || {
        let fetcher = CurlFetcher::new(job_run.timeout);
        pipeline::run(&fetcher, &job_url, &job_run, &job_abort, Some(&progress_tx))
    })
    .await
    .context("download task panicked")?;

    ctrl_c.abort();
    let _ = progress_handle.await;
    let report = result.with_context(|| format!("download of {} failed", url))?;

    println!(
        "saved {} ({} segments, {:.1} MiB in {:.1}s)",
        report.output.display(),
        report.segments,
        report.bytes as f64 / 1_048_576.0,
        report.elapsed_secs
    );
    if report.summary.retry_rounds > 0 {
        println!(
            "  {} failed attempt(s) recovered over {} retry round(s)",
            report.summary.failed_attempts, report.summary.retry_rounds
        );
    }
    Ok(())
}

//! Bounded worker pool for one phase.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use crate::control::AbortToken;

/// Run `attempt` for every ordinal in `pending` on at most `max_workers`
/// threads and hand each result to `on_result` on the calling thread.
///
/// Returns once every worker has exited (phase barrier). Workers check
/// `abort` before taking the next ordinal. Skipped ordinals and attempts that
/// panic produce no result; the worker moves on to the next ordinal.
/// `on_result` runs on the coordinating thread only, so it can own the
/// bookkeeping without locks.
pub(super) fn run_phase<T, A, R>(
    pending: Vec<usize>,
    max_workers: usize,
    abort: &AbortToken,
    attempt: A,
    mut on_result: R,
) where
    T: Send,
    A: Fn(usize) -> T + Sync,
    R: FnMut(usize, T),
{
    if pending.is_empty() {
        return;
    }
    let num_workers = max_workers.max(1).min(pending.len());
    let work: Mutex<VecDeque<usize>> = Mutex::new(pending.into());
    let (tx, rx) = mpsc::channel::<(usize, T)>();

    thread::scope(|s| {
        for _ in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            let attempt = &attempt;
            s.spawn(move || loop {
                if abort.is_raised() {
                    break;
                }
                let next = work
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(ordinal) = next else {
                    break;
                };
                let result = match panic::catch_unwind(AssertUnwindSafe(|| attempt(ordinal))) {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::error!(ordinal, "segment attempt panicked");
                        continue;
                    }
                };
                if tx.send((ordinal, result)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for (ordinal, result) in rx {
            on_result(ordinal, result);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn every_ordinal_reported_once() {
        let mut seen = Vec::new();
        run_phase((0..20).collect(), 4, &AbortToken::new(), |o| o * 2, |o, r| {
            assert_eq!(r, o * 2);
            seen.push(o);
        });
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn in_flight_never_exceeds_cap() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        run_phase(
            (0..12).collect(),
            3,
            &AbortToken::new(),
            |_| {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                in_flight.fetch_sub(1, Ordering::SeqCst);
            },
            |_, _| {},
        );
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight {} exceeded cap", peak);
        assert!(peak >= 1);
    }

    #[test]
    fn raised_abort_skips_queued_work() {
        let abort = AbortToken::new();
        abort.raise();
        let calls = AtomicUsize::new(0);
        let mut results = 0;
        run_phase(
            (0..5).collect(),
            2,
            &abort,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            },
            |_, _| results += 1,
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(results, 0);
    }

    #[test]
    fn panicking_attempt_is_dropped_and_others_complete() {
        let mut seen = Vec::new();
        run_phase(
            (0..8).collect(),
            3,
            &AbortToken::new(),
            |o| {
                if o == 3 {
                    panic!("attempt blew up");
                }
                o
            },
            |o, _| seen.push(o),
        );
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn empty_pending_is_a_noop() {
        let mut results = 0;
        run_phase(Vec::new(), 3, &AbortToken::new(), |o| o, |_, _| results += 1);
        assert_eq!(results, 0);
    }
}

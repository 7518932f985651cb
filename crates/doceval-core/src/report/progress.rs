//! Run progress. The runner emits done/total in completion order; the console
//! layer consumes it through a sink.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Called by the runner each time a case completes, successful or not.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

const PROGRESS_MIN_INTERVAL_MS: u64 = 200;

#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Running test {}/{}...", done, total)
}

/// For large runs, emit at most every this many completions.
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

struct Throttle {
    step: usize,
    last_emit: Option<Instant>,
}

impl Throttle {
    fn should_emit(&mut self, ev: ProgressEvent, now: Instant) -> bool {
        if ev.total == 0 {
            return false;
        }
        let is_final = ev.done == ev.total;
        let on_step = ev.done == 1 || ev.done.is_multiple_of(self.step);
        let interval_ok = self.last_emit.is_none_or(|t| {
            now.saturating_duration_since(t) >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS)
        });
        let emit = is_final || (on_step && interval_ok);
        if emit {
            self.last_emit = Some(now);
        }
        emit
    }
}

/// Throttled sink printing `Running test N/M...` lines to stderr. `None` for
/// single-case runs.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let state = Mutex::new(Throttle {
        step: progress_step(total),
        last_emit: None,
    });
    Some(Arc::new(move |ev: ProgressEvent| {
        let emit = match state.lock() {
            Ok(mut g) => g.should_emit(ev, Instant::now()),
            Err(_) => false,
        };
        if emit {
            eprintln!("{}", format_progress_line(ev.done, ev.total));
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        assert_eq!(format_progress_line(3, 12), "Running test 3/12...");
    }

    #[test]
    fn step_scales_with_total() {
        assert_eq!(progress_step(5), 1);
        assert_eq!(progress_step(10), 1);
        assert_eq!(progress_step(100), 10);
        assert_eq!(progress_step(15), 1);
    }

    #[test]
    fn final_event_always_emits() {
        let mut t = Throttle {
            step: 10,
            last_emit: None,
        };
        let now = Instant::now();
        assert!(t.should_emit(ProgressEvent { done: 1, total: 100 }, now));
        // within the interval: a step boundary is suppressed, the final event is not
        assert!(!t.should_emit(ProgressEvent { done: 10, total: 100 }, now));
        assert!(!t.should_emit(ProgressEvent { done: 11, total: 100 }, now));
        assert!(t.should_emit(ProgressEvent { done: 100, total: 100 }, now));
    }

    #[test]
    fn single_case_runs_have_no_sink() {
        assert!(default_progress_sink(1).is_none());
        assert!(default_progress_sink(2).is_some());
    }
}

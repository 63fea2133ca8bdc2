//! Progress reporting. A caller-supplied callback is invoked around
//! each lifecycle phase; invocations are rate-limited so a caller that
//! reports every reporting period of a long run doesn't get flooded,
//! and are guarded against re-entrancy so a callback that itself calls
//! back into the engine never triggers a nested report.

use std::time::{Duration, Instant};

/// One half of a lifecycle transition: `open()` fires `BeforeOpen` then
/// `AfterOpen`, and so on for every other entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    BeforeOpen,
    AfterOpen,
    BeforeStart,
    AfterStart,
    BeforeStep,
    AfterStep,
    BeforeEnd,
    AfterEnd,
    BeforeReport,
    AfterReport,
    BeforeClose,
    AfterClose,
}

pub type ProgressCallback = Box<dyn FnMut(LifecyclePhase, f64) + Send>;

const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Wraps a caller's callback with rate limiting (at most two calls per
/// second by default) and a re-entrancy guard. `End`/`Close` phases
/// always fire regardless of the rate limit since they're terminal and
/// rare.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    min_interval: Duration,
    last_fired: Option<Instant>,
    in_callback: bool,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            min_interval: DEFAULT_MIN_INTERVAL,
            last_fired: None,
            in_callback: false,
        }
    }

    pub fn with_rate_limit(callback: Option<ProgressCallback>, min_interval: Duration) -> Self {
        Self {
            callback,
            min_interval,
            last_fired: None,
            in_callback: false,
        }
    }

    pub fn fire(&mut self, phase: LifecyclePhase, fraction_complete: f64) {
        if self.in_callback {
            return;
        }
        let Some(callback) = self.callback.as_mut() else {
            return;
        };

        let always_fires = matches!(
            phase,
            LifecyclePhase::BeforeEnd
                | LifecyclePhase::AfterEnd
                | LifecyclePhase::BeforeClose
                | LifecyclePhase::AfterClose
        );
        let now = Instant::now();
        if !always_fires {
            if let Some(last) = self.last_fired {
                if now.duration_since(last) < self.min_interval {
                    return;
                }
            }
        }

        self.in_callback = true;
        callback(phase, fraction_complete);
        self.in_callback = false;
        self.last_fired = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn rate_limit_drops_calls_within_the_window() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut reporter = ProgressReporter::with_rate_limit(
            Some(Box::new(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            })),
            Duration::from_secs(3600),
        );
        reporter.fire(LifecyclePhase::BeforeStep, 0.1);
        reporter.fire(LifecyclePhase::AfterStep, 0.2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn terminal_phases_always_fire() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut reporter = ProgressReporter::with_rate_limit(
            Some(Box::new(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            })),
            Duration::from_secs(3600),
        );
        reporter.fire(LifecyclePhase::BeforeEnd, 1.0);
        reporter.fire(LifecyclePhase::AfterEnd, 1.0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_callback_is_a_no_op() {
        let mut reporter = ProgressReporter::new(None);
        reporter.fire(LifecyclePhase::BeforeStep, 0.5);
    }
}

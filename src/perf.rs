//! Opt-in timing of hot paths, logged when a span is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::debug;

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Measures the time until it goes out of scope.
#[must_use = "a span measures until it is dropped"]
pub struct PerfSpan {
    label: Option<String>,
    start: Instant,
}

pub fn span(label: impl Into<String>) -> PerfSpan {
    PerfSpan {
        label: is_enabled().then(|| label.into()),
        start: Instant::now(),
    }
}

impl Drop for PerfSpan {
    fn drop(&mut self) {
        if let Some(label) = &self.label {
            debug!("[perf] {label}: {:?}", self.start.elapsed());
        }
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Progress reporting for streamed operations

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Point-in-time transfer state.
///
/// `bytes_transferred` is monotonic within an operation; `total_bytes` is
/// fixed per operation, `0` when unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StorageProgress {
    pub total_bytes: u64,
    pub bytes_transferred: u64,
    pub bytes_per_second: f64,
    pub progress_percentage: f64,
}

/// Progress callback, invoked synchronously on the thread performing the
/// I/O after each buffer write.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &StorageProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&StorageProgress) + Send + Sync,
{
    fn report(&self, progress: &StorageProgress) {
        self(progress)
    }
}

/// Shared transfer accounting. Directory copies hand one tracker to every
/// file copy so aggregate progress stays monotonic.
pub(crate) struct ProgressTracker {
    total: u64,
    transferred: AtomicU64,
    started: Instant,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressTracker {
    pub fn new(total: u64, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            total,
            transferred: AtomicU64::new(0),
            started: Instant::now(),
            sink,
        }
    }

    /// Record transferred bytes and report at the chunk boundary.
    pub fn add(&self, bytes: u64) {
        let transferred = self.transferred.fetch_add(bytes, Ordering::SeqCst) + bytes;
        if let Some(sink) = &self.sink {
            let elapsed = self.started.elapsed().as_secs_f64();
            let bytes_per_second = if elapsed > 0.0 {
                transferred as f64 / elapsed
            } else {
                0.0
            };
            let progress_percentage = if self.total > 0 {
                100.0 * transferred as f64 / self.total as f64
            } else {
                0.0
            };
            sink.report(&StorageProgress {
                total_bytes: self.total,
                bytes_transferred: transferred,
                bytes_per_second,
                progress_percentage,
            });
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reports_are_monotonic_and_percentages_scale() {
        let seen: Arc<Mutex<Vec<StorageProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |progress: &StorageProgress| seen.lock().unwrap().push(*progress)
        };
        let tracker = ProgressTracker::new(100, Some(Arc::new(sink)));
        tracker.add(25);
        tracker.add(25);
        tracker.add(50);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0].bytes_transferred <= w[1].bytes_transferred));
        assert_eq!(seen[2].bytes_transferred, 100);
        assert!((seen[2].progress_percentage - 100.0).abs() < f64::EPSILON);
        assert_eq!(tracker.transferred(), 100);
    }

    #[test]
    fn unknown_totals_report_zero_percentage() {
        let seen: Arc<Mutex<Vec<StorageProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |progress: &StorageProgress| seen.lock().unwrap().push(*progress)
        };
        let tracker = ProgressTracker::new(0, Some(Arc::new(sink)));
        tracker.add(10);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].total_bytes, 0);
        assert_eq!(seen[0].progress_percentage, 0.0);
    }
}

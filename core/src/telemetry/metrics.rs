use serde::Serialize;
use std::sync::Mutex;

/// Point-in-time view of the runtime counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Readings consumed by the processing loop.
    pub readings: usize,
    /// Snapshots published to the mailbox.
    pub snapshots: usize,
    /// Readings dropped by producers on channel overflow.
    pub dropped: usize,
}

/// Shared counters for the runtime loop and its producers.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_reading(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.readings += 1;
        }
    }

    pub fn record_snapshot(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshots += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|metrics| *metrics).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let recorder = MetricsRecorder::new();
        recorder.record_reading();
        recorder.record_reading();
        recorder.record_snapshot();
        recorder.record_dropped();

        let counts = recorder.snapshot();
        assert_eq!(counts.readings, 2);
        assert_eq!(counts.snapshots, 1);
        assert_eq!(counts.dropped, 1);
    }
}

use std::time::{Duration, Instant};

/// Frame rate over one reporting interval.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ThroughputReport {
    pub frames: u64,
    pub elapsed: Duration,
    pub fps: f64,
    pub mean_frame_ms: f64,
}

/// Counts presented frames and emits a report once per interval.
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    interval: Duration,
    window_start: Option<Instant>,
    frames: u64,
}

impl ThroughputMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            window_start: None,
            frames: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Records a frame presented at `now`. Returns a report when the current
    /// interval has elapsed, and starts the next one.
    ///
    /// The first call only opens the interval.
    pub fn record(&mut self, now: Instant) -> Option<ThroughputReport> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.interval {
            return None;
        }

        let secs = elapsed.as_secs_f64();
        let report = ThroughputReport {
            frames: self.frames,
            elapsed,
            fps: self.frames as f64 / secs,
            mean_frame_ms: secs * 1000.0 / self.frames as f64,
        };

        self.window_start = Some(now);
        self.frames = 0;
        Some(report)
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_interval() {
        let t0 = Instant::now();
        let mut meter = ThroughputMeter::new(Duration::from_secs(1));

        assert!(meter.record(t0).is_none());
        // 250 frames at 4 ms each.
        let mut reports = Vec::new();
        for i in 1..=250u64 {
            if let Some(r) = meter.record(t0 + Duration::from_millis(4 * i)) {
                reports.push(r);
            }
        }

        assert_eq!(reports.len(), 1);
        let r = reports[0];
        assert_eq!(r.frames, 250);
        assert_eq!(r.elapsed, Duration::from_secs(1));
        assert!((r.fps - 250.0).abs() < 1e-9);
        assert!((r.mean_frame_ms - 4.0).abs() < 1e-9);
    }

    #[test]
    fn counters_reset_after_a_report() {
        let t0 = Instant::now();
        let mut meter = ThroughputMeter::new(Duration::from_millis(100));
        meter.record(t0);
        assert!(meter.record(t0 + Duration::from_millis(100)).is_some());
        assert!(meter.record(t0 + Duration::from_millis(150)).is_none());
        let r = meter.record(t0 + Duration::from_millis(200)).unwrap();
        assert_eq!(r.frames, 2);
    }
}

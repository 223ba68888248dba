//! Streaming-loop metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;

use mixcast_core::StreamMetrics;

/// Collects and reports per-session streaming metrics.
///
/// Counters are relaxed atomics recorded by the loop thread; snapshots can be
/// taken from any thread.
pub struct MetricsCollector {
    start_time: RwLock<Option<Instant>>,
    ticks: AtomicU64,
    late_ticks: AtomicU64,
    video_frames: AtomicU64,
    audio_frames: AtomicU64,
    last_report_time: RwLock<Instant>,
    last_tick_count: AtomicU64,
    target_tick_rate: f32,
}

impl MetricsCollector {
    /// Create a collector for the given target tick rate.
    pub fn new(target_tick_rate: f32) -> Self {
        Self {
            start_time: RwLock::new(None),
            ticks: AtomicU64::new(0),
            late_ticks: AtomicU64::new(0),
            video_frames: AtomicU64::new(0),
            audio_frames: AtomicU64::new(0),
            last_report_time: RwLock::new(Instant::now()),
            last_tick_count: AtomicU64::new(0),
            target_tick_rate,
        }
    }

    /// Start metrics collection.
    pub fn start(&self) {
        *self.start_time.write() = Some(Instant::now());
        *self.last_report_time.write() = Instant::now();
    }

    /// Stop metrics collection.
    pub fn stop(&self) {
        *self.start_time.write() = None;
    }

    /// Record a completed tick.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tick that missed its deadline.
    pub fn record_late_tick(&self) {
        self.late_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a composited video frame handed downstream.
    pub fn record_video_frame(&self) {
        self.video_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a composited audio frame handed downstream.
    pub fn record_audio_frame(&self) {
        self.audio_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a current metrics snapshot.
    pub fn snapshot(&self) -> StreamMetrics {
        let now = Instant::now();

        let last_time = *self.last_report_time.read();
        let elapsed = now.duration_since(last_time);
        let current_ticks = self.ticks.load(Ordering::Relaxed);
        let last_ticks = self.last_tick_count.load(Ordering::Relaxed);

        let tick_rate = if elapsed.as_secs_f32() > 0.0 {
            (current_ticks - last_ticks) as f32 / elapsed.as_secs_f32()
        } else {
            0.0
        };

        let uptime_seconds = self
            .start_time
            .read()
            .map(|s| now.duration_since(s).as_secs())
            .unwrap_or(0);

        StreamMetrics {
            ticks: current_ticks,
            late_ticks: self.late_ticks.load(Ordering::Relaxed),
            video_frames: self.video_frames.load(Ordering::Relaxed),
            audio_frames: self.audio_frames.load(Ordering::Relaxed),
            tick_rate,
            target_tick_rate: self.target_tick_rate,
            uptime_seconds,
        }
    }

    /// Update the report marker for the tick-rate calculation.
    pub fn mark_reported(&self) {
        *self.last_report_time.write() = Instant::now();
        self.last_tick_count
            .store(self.ticks.load(Ordering::Relaxed), Ordering::Relaxed);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsCollector::new(60.0);
        metrics.start();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_late_tick();
        metrics.record_video_frame();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.late_ticks, 1);
        assert_eq!(snapshot.video_frames, 1);
        assert_eq!(snapshot.audio_frames, 0);
        assert_eq!(snapshot.target_tick_rate, 60.0);
    }

    #[test]
    fn test_mark_reported_resets_rate_window() {
        let metrics = MetricsCollector::new(60.0);
        metrics.start();
        metrics.record_tick();
        metrics.mark_reported();

        // No ticks since the marker: the measured rate is zero.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(metrics.snapshot().tick_rate, 0.0);
    }

    #[test]
    fn test_uptime_zero_when_stopped() {
        let metrics = MetricsCollector::new(60.0);
        assert_eq!(metrics.snapshot().uptime_seconds, 0);
        metrics.start();
        metrics.stop();
        assert_eq!(metrics.snapshot().uptime_seconds, 0);
    }
}

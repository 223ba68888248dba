//! Streaming metrics snapshot.

use serde::{Deserialize, Serialize};

/// Point-in-time metrics for a streaming session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamMetrics {
    /// Ticks completed since streaming started.
    pub ticks: u64,

    /// Ticks that started after their deadline had already passed.
    pub late_ticks: u64,

    /// Composited video frames handed downstream.
    pub video_frames: u64,

    /// Composited audio frames handed downstream.
    pub audio_frames: u64,

    /// Measured tick rate since the last report.
    pub tick_rate: f32,

    /// Configured tick rate.
    pub target_tick_rate: f32,

    /// Seconds since streaming started.
    pub uptime_seconds: u64,
}

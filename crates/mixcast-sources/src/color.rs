//! Solid-color video source.

use bytes::Bytes;
use tracing::{debug, info};

use mixcast_core::{
    AudioFrame, Component, ComponentResult, PixelFormat, Source, StreamClock, VideoFrame,
};

use crate::COLOR_SOURCE_ID;

/// A source that produces the same solid-color RGBA frame every call.
///
/// The pixel payload is built once at `initialize` and shared by reference
/// into every delivered frame; only the timestamp is fresh per call.
pub struct ColorSource {
    name: String,
    clock: StreamClock,
    width: u32,
    height: u32,
    /// Premultiplied RGBA fill color.
    color: [u8; 4],
    payload: Option<Bytes>,
    active: bool,
}

impl ColorSource {
    /// Create an opaque red 1920×1080 source.
    pub fn new(name: impl Into<String>, clock: StreamClock) -> Self {
        Self::with_color(name, clock, 1920, 1080, [255, 0, 0, 255])
    }

    /// Create a source with explicit geometry and premultiplied fill color.
    pub fn with_color(
        name: impl Into<String>,
        clock: StreamClock,
        width: u32,
        height: u32,
        color: [u8; 4],
    ) -> Self {
        Self {
            name: name.into(),
            clock,
            width,
            height,
            color,
            payload: None,
            active: false,
        }
    }

    fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

impl Component for ColorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        COLOR_SOURCE_ID
    }

    fn initialize(&mut self) -> ComponentResult<()> {
        if self.payload.is_some() {
            debug!(name = %self.name, "color source already initialized");
            return Ok(());
        }

        let mut pixels = vec![0u8; self.stride() * self.height as usize];
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&self.color);
        }
        self.payload = Some(Bytes::from(pixels));

        info!(name = %self.name, width = self.width, height = self.height, "color source initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop();
        self.payload = None;
        info!(name = %self.name, "color source shut down");
    }
}

impl Source for ColorSource {
    fn start(&mut self) {
        self.active = true;
        debug!(name = %self.name, "color source started");
    }

    fn stop(&mut self) {
        self.active = false;
        debug!(name = %self.name, "color source stopped");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn video_frame(&mut self) -> Option<VideoFrame> {
        if !self.active {
            return None;
        }
        let payload = self.payload.as_ref()?.clone();
        Some(VideoFrame::packed(
            payload,
            self.stride(),
            self.width,
            self.height,
            PixelFormat::Rgba,
            self.clock.now_us(),
        ))
    }

    fn audio_frame(&mut self) -> Option<AudioFrame> {
        // Video-only source.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialized_source() -> ColorSource {
        let mut source = ColorSource::with_color("test", StreamClock::start(), 64, 32, [0, 255, 0, 255]);
        source.initialize().expect("initialize");
        source
    }

    #[test]
    fn test_inactive_source_produces_nothing() {
        let mut source = initialized_source();
        assert!(source.video_frame().is_none());
    }

    #[test]
    fn test_active_source_produces_valid_frames() {
        let mut source = initialized_source();
        source.start();

        let frame = source.video_frame().expect("frame while active");
        assert!(frame.is_valid());
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 32);
        assert_eq!(frame.format, PixelFormat::Rgba);
        assert_eq!(&frame.planes[0].data[..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn test_stop_gates_production_until_restart() {
        let mut source = initialized_source();
        source.start();
        assert!(source.video_frame().is_some());

        source.stop();
        assert!(source.video_frame().is_none());
        assert!(source.video_frame().is_none());

        source.start();
        assert!(source.video_frame().is_some());
    }

    #[test]
    fn test_timestamps_are_monotonic() {
        let mut source = initialized_source();
        source.start();
        let a = source.video_frame().unwrap().timestamp_us;
        let b = source.video_frame().unwrap().timestamp_us;
        assert!(b >= a);
    }

    #[test]
    fn test_double_initialize_is_a_no_op() {
        let mut source = initialized_source();
        let payload = source.payload.clone().unwrap();
        source.initialize().expect("second initialize");
        // Same cached payload, no rebuild.
        assert_eq!(payload.as_ptr(), source.payload.as_ref().unwrap().as_ptr());
    }

    #[test]
    fn test_shutdown_is_safe_before_initialize() {
        let mut source = ColorSource::new("fresh", StreamClock::start());
        source.shutdown();
        assert!(!source.is_active());
    }

    #[test]
    fn test_audio_is_always_absent() {
        let mut source = initialized_source();
        source.start();
        assert!(source.audio_frame().is_none());
    }
}

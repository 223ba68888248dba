//! Tone and silence audio source.

use std::f32::consts::TAU;
use std::sync::Arc;

use tracing::{debug, info};

use mixcast_core::{AudioFrame, Component, ComponentResult, Source, StreamClock, VideoFrame};

use crate::TONE_SOURCE_ID;

/// Samples delivered per frame (one 60 Hz tick's worth at 48 kHz).
pub const SAMPLES_PER_FRAME: usize = 800;

/// A source that produces a sine tone, or silence at zero amplitude.
///
/// Phase is carried across calls so consecutive frames are continuous.
pub struct ToneSource {
    name: String,
    clock: StreamClock,
    sample_rate: u32,
    channels: u16,
    frequency_hz: f32,
    amplitude: f32,
    phase: f32,
    initialized: bool,
    active: bool,
}

impl ToneSource {
    /// Create a 440 Hz stereo tone at 48 kHz.
    pub fn new(name: impl Into<String>, clock: StreamClock) -> Self {
        Self::with_tone(name, clock, 48000, 2, 440.0, 0.25)
    }

    /// Create a silent source (useful as a placeholder audio bed).
    pub fn silence(name: impl Into<String>, clock: StreamClock) -> Self {
        Self::with_tone(name, clock, 48000, 2, 0.0, 0.0)
    }

    /// Create a source with explicit tuning.
    pub fn with_tone(
        name: impl Into<String>,
        clock: StreamClock,
        sample_rate: u32,
        channels: u16,
        frequency_hz: f32,
        amplitude: f32,
    ) -> Self {
        Self {
            name: name.into(),
            clock,
            sample_rate,
            channels,
            frequency_hz,
            amplitude,
            phase: 0.0,
            initialized: false,
            active: false,
        }
    }
}

impl Component for ToneSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        TONE_SOURCE_ID
    }

    fn initialize(&mut self) -> ComponentResult<()> {
        if self.initialized {
            debug!(name = %self.name, "tone source already initialized");
            return Ok(());
        }
        self.phase = 0.0;
        self.initialized = true;
        info!(
            name = %self.name,
            sample_rate = self.sample_rate,
            frequency_hz = self.frequency_hz,
            "tone source initialized"
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop();
        self.initialized = false;
        info!(name = %self.name, "tone source shut down");
    }
}

impl Source for ToneSource {
    fn start(&mut self) {
        self.active = true;
        debug!(name = %self.name, "tone source started");
    }

    fn stop(&mut self) {
        self.active = false;
        debug!(name = %self.name, "tone source stopped");
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn video_frame(&mut self) -> Option<VideoFrame> {
        // Audio-only source.
        None
    }

    fn audio_frame(&mut self) -> Option<AudioFrame> {
        if !self.active || !self.initialized {
            return None;
        }

        let step = TAU * self.frequency_hz / self.sample_rate as f32;
        let mut samples = Vec::with_capacity(SAMPLES_PER_FRAME);
        for _ in 0..SAMPLES_PER_FRAME {
            samples.push(self.amplitude * self.phase.sin());
            self.phase = (self.phase + step) % TAU;
        }

        // The same plane backs every channel.
        let plane: Arc<[f32]> = samples.into();
        Some(AudioFrame {
            planes: vec![plane; usize::from(self.channels)],
            samples: SAMPLES_PER_FRAME,
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_us: self.clock.now_us(),
        })
    }
}

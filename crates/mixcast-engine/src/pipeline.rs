//! Downstream filter → encoder → output chain.

use tracing::{debug, warn};

use mixcast_core::{AudioFrame, SharedEncoder, SharedFilter, SharedOutput, VideoFrame};

/// The chain composited frames are fed through once per scene per tick.
///
/// Every stage is optional; a bare engine streams with no downstream
/// consumers at all. Filters run in attachment order and may drop a frame.
/// Encoders each see whatever survives the filters. Outputs only get
/// lifecycle start/stop from the engine — delivering encoded packets to them
/// is the encoder/output pair's concern.
#[derive(Default)]
pub struct RenderPipeline {
    filters: Vec<SharedFilter>,
    encoders: Vec<SharedEncoder>,
    outputs: Vec<SharedOutput>,
}

impl RenderPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the chain.
    pub fn add_filter(&mut self, filter: SharedFilter) {
        self.filters.push(filter);
    }

    /// Attach an encoder.
    pub fn add_encoder(&mut self, encoder: SharedEncoder) {
        self.encoders.push(encoder);
    }

    /// Attach an output.
    pub fn add_output(&mut self, output: SharedOutput) {
        self.outputs.push(output);
    }

    /// Start every attached output. Called when streaming starts.
    pub fn start_outputs(&self) {
        for output in &self.outputs {
            let mut output = output.lock();
            if let Err(e) = output.start() {
                warn!(output = %output.name(), "output failed to start: {}", e);
            }
        }
    }

    /// Stop every attached output. Idempotent.
    pub fn stop_outputs(&self) {
        for output in &self.outputs {
            output.lock().stop();
        }
    }

    /// Shut down and detach every component in the chain.
    pub fn shutdown_components(&mut self) {
        for filter in &self.filters {
            filter.lock().shutdown();
        }
        for encoder in &self.encoders {
            encoder.lock().shutdown();
        }
        for output in &self.outputs {
            output.lock().shutdown();
        }
        self.filters.clear();
        self.encoders.clear();
        self.outputs.clear();
    }

    /// Feed one scene's composited frames through the chain.
    pub fn process(&self, video: Option<VideoFrame>, audio: Option<AudioFrame>) {
        let mut video = video;
        let mut audio = audio;

        for filter in &self.filters {
            let mut filter = filter.lock();
            if let Some(frame) = video.as_mut() {
                if !filter.process_video(frame) {
                    debug!(filter = %filter.name(), "filter dropped video frame");
                    video = None;
                }
            }
            if let Some(frame) = audio.as_mut() {
                if !filter.process_audio(frame) {
                    debug!(filter = %filter.name(), "filter dropped audio frame");
                    audio = None;
                }
            }
        }

        for encoder in &self.encoders {
            let mut encoder = encoder.lock();
            if let Some(frame) = &video {
                if let Err(e) = encoder.encode_video(frame) {
                    warn!(encoder = %encoder.name(), "video encode failed: {}", e);
                }
            }
            if let Some(frame) = &audio {
                if let Err(e) = encoder.encode_audio(frame) {
                    warn!(encoder = %encoder.name(), "audio encode failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use parking_lot::Mutex;

    use mixcast_core::{Component, ComponentResult, Encoder, Filter, PixelFormat};

    use super::*;

    fn test_frame() -> VideoFrame {
        VideoFrame::packed(Bytes::from(vec![0u8; 64]), 16, 4, 1, PixelFormat::Rgba, 0)
    }

    struct CountingEncoder {
        video_seen: usize,
        audio_seen: usize,
    }

    impl Component for CountingEncoder {
        fn name(&self) -> &str {
            "counting"
        }

        fn id(&self) -> &str {
            "counting_encoder"
        }

        fn initialize(&mut self) -> ComponentResult<()> {
            Ok(())
        }

        fn shutdown(&mut self) {}
    }

    impl Encoder for CountingEncoder {
        fn encode_video(&mut self, _frame: &VideoFrame) -> ComponentResult<()> {
            self.video_seen += 1;
            Ok(())
        }

        fn encode_audio(&mut self, _frame: &AudioFrame) -> ComponentResult<()> {
            self.audio_seen += 1;
            Ok(())
        }
    }

    struct DropVideoFilter;

    impl Component for DropVideoFilter {
        fn name(&self) -> &str {
            "drop-video"
        }

        fn id(&self) -> &str {
            "drop_filter"
        }

        fn initialize(&mut self) -> ComponentResult<()> {
            Ok(())
        }

        fn shutdown(&mut self) {}
    }

    impl Filter for DropVideoFilter {
        fn process_video(&mut self, _frame: &mut VideoFrame) -> bool {
            false
        }

        fn process_audio(&mut self, _frame: &mut AudioFrame) -> bool {
            true
        }
    }

    #[test]
    fn test_empty_pipeline_is_a_noop() {
        let pipeline = RenderPipeline::new();
        pipeline.process(Some(test_frame()), None);
    }

    #[test]
    fn test_encoder_sees_frames() {
        let mut pipeline = RenderPipeline::new();
        let encoder = Arc::new(Mutex::new(CountingEncoder {
            video_seen: 0,
            audio_seen: 0,
        }));
        pipeline.add_encoder(encoder.clone());

        pipeline.process(Some(test_frame()), None);
        pipeline.process(Some(test_frame()), None);

        assert_eq!(encoder.lock().video_seen, 2);
        assert_eq!(encoder.lock().audio_seen, 0);
    }

    #[test]
    fn test_filter_drop_starves_encoders() {
        let mut pipeline = RenderPipeline::new();
        let encoder = Arc::new(Mutex::new(CountingEncoder {
            video_seen: 0,
            audio_seen: 0,
        }));
        pipeline.add_filter(Arc::new(Mutex::new(DropVideoFilter)));
        pipeline.add_encoder(encoder.clone());

        pipeline.process(Some(test_frame()), None);

        assert_eq!(encoder.lock().video_seen, 0);
    }
}

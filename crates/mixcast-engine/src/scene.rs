//! Scenes: ordered source collections composited to one frame per render.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use mixcast_core::{
    AudioFrame, AudioSettings, ComponentResult, PixelFormat, SharedSource, StreamSettings,
    VideoFrame, VideoSettings,
};

use crate::compositor;

/// A named, ordered collection of sources rendered to one composited frame
/// per call.
///
/// Scenes are shared as `Arc<Scene>` between the caller and the streaming
/// loop. Every operation serializes on one internal lock, held for the whole
/// render, so a render never observes a half-mutated source list and never
/// returns a frame from a source removed mid-call.
///
/// Composition is back-to-front in insertion order: the first source added
/// is the bottom layer. Video alpha-blends onto an RGBA canvas sized from
/// the engine settings; audio is sample-accumulated and clamped.
pub struct Scene {
    name: String,
    inner: Mutex<SceneInner>,
}

struct SceneInner {
    initialized: bool,
    sources: Vec<SharedSource>,
    video: VideoSettings,
    audio: AudioSettings,
    samples_per_tick: usize,
}

impl Scene {
    /// Scenes are created through `Engine::create_scene`.
    pub(crate) fn new(name: impl Into<String>, settings: &StreamSettings) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(SceneInner {
                initialized: false,
                sources: Vec::new(),
                video: settings.video.clone(),
                audio: settings.audio.clone(),
                samples_per_tick: settings.samples_per_tick(),
            }),
        }
    }

    /// Human-readable scene name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag.
    pub fn id(&self) -> &str {
        "scene"
    }

    /// Prepare the scene for rendering. Idempotent.
    pub fn initialize(&self) -> ComponentResult<()> {
        let mut inner = self.inner.lock();
        if inner.initialized {
            debug!(scene = %self.name, "scene already initialized");
            return Ok(());
        }
        inner.initialized = true;
        info!(scene = %self.name, "scene initialized");
        Ok(())
    }

    /// Stop every active source, then clear the scene. Safe to call multiple
    /// times and before `initialize`.
    #[instrument(name = "scene_shutdown", skip(self), fields(scene = %self.name))]
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        for source in &inner.sources {
            let mut source = source.lock();
            if source.is_active() {
                source.stop();
            }
        }
        inner.sources.clear();
        inner.initialized = false;
        info!("scene shut down");
    }

    /// Append a source. Re-adding a handle already present is a logged no-op;
    /// identity is the allocation, not the name.
    pub fn add_source(&self, source: &SharedSource) {
        let mut inner = self.inner.lock();
        if inner.sources.iter().any(|s| Arc::ptr_eq(s, source)) {
            warn!(
                scene = %self.name,
                source = %source.lock().name(),
                "source already in scene"
            );
            return;
        }
        inner.sources.push(Arc::clone(source));
        info!(scene = %self.name, source = %source.lock().name(), "source added");
    }

    /// Unlink a source, stopping it first if it is active. Removing a source
    /// that is not present is a logged no-op.
    pub fn remove_source(&self, source: &SharedSource) {
        let mut inner = self.inner.lock();
        let Some(index) = inner.sources.iter().position(|s| Arc::ptr_eq(s, source)) else {
            debug!(scene = %self.name, "remove of source not in scene");
            return;
        };

        {
            let mut source = source.lock();
            if source.is_active() {
                source.stop();
            }
        }
        inner.sources.remove(index);
        info!(scene = %self.name, source = %source.lock().name(), "source removed");
    }

    /// Number of sources in the scene.
    pub fn source_count(&self) -> usize {
        self.inner.lock().sources.len()
    }

    /// Source at `index` in composition order, if any.
    pub fn source_at(&self, index: usize) -> Option<SharedSource> {
        self.inner.lock().sources.get(index).cloned()
    }

    /// First source with the given name, if any.
    pub fn find_source_by_name(&self, name: &str) -> Option<SharedSource> {
        self.inner
            .lock()
            .sources
            .iter()
            .find(|s| s.lock().name() == name)
            .cloned()
    }

    /// Composite every active source onto the scene canvas, bottom layer
    /// first. `None` when the scene is uninitialized or empty, or when no
    /// active source contributed a frame.
    pub fn render_video(&self) -> Option<VideoFrame> {
        let inner = self.inner.lock();
        if !inner.initialized || inner.sources.is_empty() {
            return None;
        }

        let width = inner.video.width;
        let height = inner.video.height;
        let stride = width as usize * 4;
        let mut canvas = vec![0u8; stride * height as usize];
        let mut timestamp_us = 0u64;
        let mut contributed = false;

        for source in &inner.sources {
            let mut source = source.lock();
            if !source.is_active() {
                continue;
            }
            let Some(frame) = source.video_frame() else {
                continue;
            };
            if compositor::blit_over(&mut canvas, stride, width, height, &frame) {
                contributed = true;
                timestamp_us = timestamp_us.max(frame.timestamp_us);
            } else {
                debug!(
                    scene = %self.name,
                    source = %source.name(),
                    format = ?frame.format,
                    "skipping video frame the compositor cannot blend"
                );
            }
        }

        if !contributed {
            return None;
        }
        Some(VideoFrame::packed(
            Bytes::from(canvas),
            stride,
            width,
            height,
            PixelFormat::Rgba,
            timestamp_us,
        ))
    }

    /// Mix every active source into one audio frame at the scene's sample
    /// rate. `None` under the same conditions as `render_video`.
    pub fn render_audio(&self) -> Option<AudioFrame> {
        let inner = self.inner.lock();
        if !inner.initialized || inner.sources.is_empty() {
            return None;
        }

        let channels = usize::from(inner.audio.channels);
        let samples = inner.samples_per_tick;
        let mut acc: Vec<Vec<f32>> = vec![vec![0.0; samples]; channels];
        let mut timestamp_us = 0u64;
        let mut contributed = false;

        for source in &inner.sources {
            let mut source = source.lock();
            if !source.is_active() {
                continue;
            }
            let Some(frame) = source.audio_frame() else {
                continue;
            };
            if compositor::mix_into(&mut acc, inner.audio.sample_rate, &frame) {
                contributed = true;
                timestamp_us = timestamp_us.max(frame.timestamp_us);
            } else {
                debug!(
                    scene = %self.name,
                    source = %source.name(),
                    sample_rate = frame.sample_rate,
                    "skipping audio frame the mixer cannot fold in"
                );
            }
        }

        if !contributed {
            return None;
        }
        compositor::clamp_planes(&mut acc);
        Some(AudioFrame {
            planes: acc.into_iter().map(Arc::from).collect(),
            samples,
            sample_rate: inner.audio.sample_rate,
            channels: inner.audio.channels,
            timestamp_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use mixcast_core::{Component, Source};

    use super::*;

    /// Deterministic in-memory source: solid-color video plus a constant
    /// audio level, timestamped from a counter.
    struct TestSource {
        name: String,
        active: bool,
        width: u32,
        height: u32,
        pixel: [u8; 4],
        level: f32,
        serial: u64,
    }

    impl TestSource {
        fn shared(name: &str, pixel: [u8; 4], level: f32) -> SharedSource {
            Arc::new(Mutex::new(Self {
                name: name.to_string(),
                active: false,
                width: 8,
                height: 8,
                pixel,
                level,
                serial: 0,
            }))
        }
    }

    impl Component for TestSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn id(&self) -> &str {
            "test_source"
        }

        fn initialize(&mut self) -> ComponentResult<()> {
            Ok(())
        }

        fn shutdown(&mut self) {
            self.active = false;
        }
    }

    impl Source for TestSource {
        fn start(&mut self) {
            self.active = true;
        }

        fn stop(&mut self) {
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn video_frame(&mut self) -> Option<VideoFrame> {
            if !self.active {
                return None;
            }
            self.serial += 1;
            let stride = self.width as usize * 4;
            let mut data = vec![0u8; stride * self.height as usize];
            for px in data.chunks_exact_mut(4) {
                px.copy_from_slice(&self.pixel);
            }
            Some(VideoFrame::packed(
                Bytes::from(data),
                stride,
                self.width,
                self.height,
                PixelFormat::Rgba,
                self.serial,
            ))
        }

        fn audio_frame(&mut self) -> Option<AudioFrame> {
            if !self.active {
                return None;
            }
            self.serial += 1;
            let plane: Arc<[f32]> = vec![self.level; 800].into();
            Some(AudioFrame {
                planes: vec![plane.clone(), plane],
                samples: 800,
                sample_rate: 48000,
                channels: 2,
                timestamp_us: self.serial,
            })
        }
    }

    fn small_settings() -> StreamSettings {
        let mut settings = StreamSettings::default();
        settings.video.width = 8;
        settings.video.height = 8;
        settings
    }

    fn ready_scene() -> Scene {
        let scene = Scene::new("test", &small_settings());
        scene.initialize().expect("initialize");
        scene
    }

    fn started(source: &SharedSource) {
        source.lock().start();
    }

    #[test]
    fn test_add_source_is_idempotent_per_handle() {
        let scene = ready_scene();
        let source = TestSource::shared("a", [255, 0, 0, 255], 0.1);

        scene.add_source(&source);
        scene.add_source(&source);
        assert_eq!(scene.source_count(), 1);

        // Same name, different allocation: a distinct source.
        let twin = TestSource::shared("a", [255, 0, 0, 255], 0.1);
        scene.add_source(&twin);
        assert_eq!(scene.source_count(), 2);
    }

    #[test]
    fn test_render_requires_initialize_and_sources() {
        let scene = Scene::new("bare", &small_settings());
        assert!(scene.render_video().is_none());

        scene.initialize().expect("initialize");
        assert!(scene.render_video().is_none());
        assert!(scene.render_audio().is_none());
    }

    #[test]
    fn test_render_matches_canvas_dimensions() {
        let scene = ready_scene();
        let source = TestSource::shared("a", [9, 9, 9, 255], 0.1);
        started(&source);
        scene.add_source(&source);

        let frame = scene.render_video().expect("composited frame");
        assert!(frame.is_valid());
        assert_eq!((frame.width, frame.height), (8, 8));
        assert_eq!(frame.format, PixelFormat::Rgba);
    }

    #[test]
    fn test_inactive_sources_do_not_render() {
        let scene = ready_scene();
        let source = TestSource::shared("a", [9, 9, 9, 255], 0.1);
        scene.add_source(&source);
        assert!(scene.render_video().is_none());

        started(&source);
        assert!(scene.render_video().is_some());

        source.lock().stop();
        assert!(scene.render_video().is_none());
    }

    #[test]
    fn test_later_sources_composite_on_top() {
        let scene = ready_scene();
        let bottom = TestSource::shared("bottom", [255, 0, 0, 255], 0.0);
        let top = TestSource::shared("top", [0, 255, 0, 255], 0.0);
        started(&bottom);
        started(&top);
        scene.add_source(&bottom);
        scene.add_source(&top);

        let frame = scene.render_video().unwrap();
        assert_eq!(&frame.planes[0].data[..4], &[0, 255, 0, 255]);

        // Once the top layer is removed, its pixels never appear again.
        scene.remove_source(&top);
        let frame = scene.render_video().unwrap();
        assert_eq!(&frame.planes[0].data[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_remove_source_stops_it_and_unlinks() {
        let scene = ready_scene();
        let source = TestSource::shared("a", [9, 9, 9, 255], 0.1);
        started(&source);
        scene.add_source(&source);

        scene.remove_source(&source);
        assert_eq!(scene.source_count(), 0);
        assert!(!source.lock().is_active());
        assert!(scene.render_video().is_none());

        // Removing again is a no-op.
        scene.remove_source(&source);
        assert_eq!(scene.source_count(), 0);
    }

    #[test]
    fn test_audio_mix_sums_and_clamps() {
        let scene = ready_scene();
        let a = TestSource::shared("a", [0, 0, 0, 0], 0.6);
        let b = TestSource::shared("b", [0, 0, 0, 0], 0.6);
        started(&a);
        started(&b);
        scene.add_source(&a);
        scene.add_source(&b);

        let frame = scene.render_audio().expect("mixed frame");
        assert!(frame.is_valid());
        assert_eq!(frame.samples, 800);
        assert_eq!(frame.channels, 2);
        // 0.6 + 0.6 clamps to 1.0.
        assert!((frame.planes[0][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_introspection() {
        let scene = ready_scene();
        let a = TestSource::shared("a", [1, 1, 1, 255], 0.1);
        let b = TestSource::shared("b", [2, 2, 2, 255], 0.2);
        scene.add_source(&a);
        scene.add_source(&b);

        assert!(Arc::ptr_eq(&scene.source_at(0).unwrap(), &a));
        assert!(Arc::ptr_eq(&scene.source_at(1).unwrap(), &b));
        assert!(scene.source_at(2).is_none());
        assert!(Arc::ptr_eq(&scene.find_source_by_name("b").unwrap(), &b));
        assert!(scene.find_source_by_name("missing").is_none());
    }

    #[test]
    fn test_shutdown_stops_sources_and_clears() {
        let scene = ready_scene();
        let source = TestSource::shared("a", [9, 9, 9, 255], 0.1);
        started(&source);
        scene.add_source(&source);

        scene.shutdown();
        assert!(!source.lock().is_active());
        assert_eq!(scene.source_count(), 0);

        // Safe to call again, and on a never-initialized scene.
        scene.shutdown();
        Scene::new("fresh", &small_settings()).shutdown();
    }

    #[test]
    fn test_composited_timestamp_is_max_of_contributors() {
        let scene = ready_scene();
        let a = TestSource::shared("a", [9, 9, 9, 255], 0.1);
        started(&a);
        scene.add_source(&a);

        let first = scene.render_video().unwrap().timestamp_us;
        let second = scene.render_video().unwrap().timestamp_us;
        assert!(second > first);
    }
}

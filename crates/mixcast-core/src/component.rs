//! Capability contracts implemented by every component kind.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ComponentResult;
use crate::frame::{AudioFrame, VideoFrame};

/// Base lifecycle contract shared by every component kind.
///
/// Lifecycle: Uninitialized → Initialized → ShutDown, with sources adding an
/// Active ⇄ Inactive toggle in between. Identity (`name`, `id`) is fixed at
/// construction.
pub trait Component: Send {
    /// Human-readable label. May collide across components.
    fn name(&self) -> &str;

    /// Type tag; for registry-created components, the factory key.
    fn id(&self) -> &str;

    /// Acquire prerequisite resources. Idempotent: calling again while
    /// initialized succeeds without side effects. On failure the component
    /// stays uninitialized.
    fn initialize(&mut self) -> ComponentResult<()>;

    /// Tear down unconditionally. Safe to call multiple times and before
    /// `initialize`; stops any active production first.
    fn shutdown(&mut self);
}

/// A producer of video and/or audio frames.
pub trait Source: Component {
    /// Begin producing frames. Idempotent.
    fn start(&mut self);

    /// Stop producing frames. Idempotent. Once this returns, no frame is
    /// delivered until the next `start`.
    fn stop(&mut self);

    /// Whether the source is currently producing.
    fn is_active(&self) -> bool;

    /// Next video frame. `None` while inactive, and always for audio-only
    /// sources — an expected outcome, not an error.
    fn video_frame(&mut self) -> Option<VideoFrame>;

    /// Next audio frame. `None` while inactive, and always for video-only
    /// sources.
    fn audio_frame(&mut self) -> Option<AudioFrame>;
}

/// Consumes composited frames and produces an encoded bitstream.
pub trait Encoder: Component {
    /// Encode one video frame.
    fn encode_video(&mut self, frame: &VideoFrame) -> ComponentResult<()>;

    /// Encode one audio frame.
    fn encode_audio(&mut self, frame: &AudioFrame) -> ComponentResult<()>;
}

/// Delivers encoded media to a destination.
pub trait Output: Component {
    /// Begin accepting media.
    fn start(&mut self) -> ComponentResult<()>;

    /// Stop accepting media. Idempotent.
    fn stop(&mut self);

    /// Whether the output is currently accepting media.
    fn is_active(&self) -> bool;
}

/// Transforms frames between scene render and encoding.
pub trait Filter: Component {
    /// Process a video frame in place. Returns `false` to drop the frame
    /// from the pipeline.
    fn process_video(&mut self, frame: &mut VideoFrame) -> bool;

    /// Process an audio frame in place. Returns `false` to drop the frame.
    fn process_audio(&mut self, frame: &mut AudioFrame) -> bool;
}

/// Shared source handle. Sources cross threads (caller and streaming loop)
/// and may belong to several scenes, so handles pair `Arc` sharing with a
/// mutex. Identity is the allocation: compare with `Arc::ptr_eq`.
pub type SharedSource = Arc<Mutex<dyn Source>>;

/// Shared encoder handle.
pub type SharedEncoder = Arc<Mutex<dyn Encoder>>;

/// Shared output handle.
pub type SharedOutput = Arc<Mutex<dyn Output>>;

/// Shared filter handle.
pub type SharedFilter = Arc<Mutex<dyn Filter>>;

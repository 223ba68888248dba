//! Shared contracts for the mixcast engine.
//!
//! This crate defines the frame types, component capability traits, stream
//! clock, settings, and event types used across the engine, the built-in
//! components, and the CLI.

mod clock;
mod component;
mod error;
mod events;
mod frame;
mod metrics;
mod settings;
mod state;

pub use clock::StreamClock;
pub use component::{
    Component, Encoder, Filter, Output, SharedEncoder, SharedFilter, SharedOutput, SharedSource,
    Source,
};
pub use error::{ComponentError, ComponentResult};
pub use events::EngineEvent;
pub use frame::{
    AudioFrame, PixelFormat, VideoFrame, VideoPlane, MAX_AUDIO_CHANNELS, MAX_VIDEO_PLANES,
};
pub use metrics::StreamMetrics;
pub use settings::{AudioSettings, StreamSettings, VideoSettings};
pub use state::StreamState;

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for events (engine → observers).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}

//! Core coordination for mixcast.
//!
//! This crate hosts the engine, its scenes, the component registry, the
//! render pipeline, and the background streaming loop.

mod compositor;
mod engine;
mod metrics;
mod pipeline;
mod registry;
mod scene;

pub use engine::Engine;
pub use metrics::MetricsCollector;
pub use pipeline::RenderPipeline;
pub use registry::{
    ComponentRegistry, EncoderFactory, FilterFactory, OutputFactory, SourceFactory,
};
pub use scene::Scene;

use crossbeam_channel::Receiver;

use mixcast_core::{event_channel, EngineEvent, StreamSettings};

/// Create an engine with an attached event receiver.
pub fn create_engine(settings: StreamSettings) -> (Engine, Receiver<EngineEvent>) {
    let (event_tx, event_rx) = event_channel();
    (Engine::new(settings, event_tx), event_rx)
}

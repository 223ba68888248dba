//! Component factory registry.

use std::collections::HashMap;

use tracing::{debug, warn};

use mixcast_core::{SharedEncoder, SharedFilter, SharedOutput, SharedSource, StreamClock};

/// Factory for sources: takes the instance name and the engine clock.
pub type SourceFactory = Box<dyn Fn(&str, StreamClock) -> SharedSource + Send + Sync>;

/// Factory for encoders.
pub type EncoderFactory = Box<dyn Fn(&str, StreamClock) -> SharedEncoder + Send + Sync>;

/// Factory for outputs.
pub type OutputFactory = Box<dyn Fn(&str, StreamClock) -> SharedOutput + Send + Sync>;

/// Factory for filters.
pub type FilterFactory = Box<dyn Fn(&str, StreamClock) -> SharedFilter + Send + Sync>;

/// Maps component-type ids to factories, one table per component kind.
///
/// A lookup miss is the expected outcome for every id until a factory is
/// registered under it, and is reported as `None`, never as an error.
#[derive(Default)]
pub struct ComponentRegistry {
    sources: HashMap<String, SourceFactory>,
    encoders: HashMap<String, EncoderFactory>,
    outputs: HashMap<String, OutputFactory>,
    filters: HashMap<String, FilterFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source factory under `id`, replacing any previous one.
    pub fn register_source(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedSource + Send + Sync + 'static,
    ) {
        if self.sources.insert(id.to_string(), Box::new(factory)).is_some() {
            warn!(id, "replacing registered source factory");
        }
        debug!(id, "source factory registered");
    }

    /// Register an encoder factory under `id`.
    pub fn register_encoder(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedEncoder + Send + Sync + 'static,
    ) {
        if self.encoders.insert(id.to_string(), Box::new(factory)).is_some() {
            warn!(id, "replacing registered encoder factory");
        }
        debug!(id, "encoder factory registered");
    }

    /// Register an output factory under `id`.
    pub fn register_output(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedOutput + Send + Sync + 'static,
    ) {
        if self.outputs.insert(id.to_string(), Box::new(factory)).is_some() {
            warn!(id, "replacing registered output factory");
        }
        debug!(id, "output factory registered");
    }

    /// Register a filter factory under `id`.
    pub fn register_filter(
        &mut self,
        id: &str,
        factory: impl Fn(&str, StreamClock) -> SharedFilter + Send + Sync + 'static,
    ) {
        if self.filters.insert(id.to_string(), Box::new(factory)).is_some() {
            warn!(id, "replacing registered filter factory");
        }
        debug!(id, "filter factory registered");
    }

    /// Create a source by id, or `None` when no factory is registered.
    pub fn create_source(&self, id: &str, name: &str, clock: StreamClock) -> Option<SharedSource> {
        let Some(factory) = self.sources.get(id) else {
            warn!(id, name, "no source factory registered for id");
            return None;
        };
        debug!(id, name, "creating source");
        Some(factory(name, clock))
    }

    /// Create an encoder by id, or `None` when no factory is registered.
    pub fn create_encoder(
        &self,
        id: &str,
        name: &str,
        clock: StreamClock,
    ) -> Option<SharedEncoder> {
        let Some(factory) = self.encoders.get(id) else {
            warn!(id, name, "no encoder factory registered for id");
            return None;
        };
        debug!(id, name, "creating encoder");
        Some(factory(name, clock))
    }

    /// Create an output by id, or `None` when no factory is registered.
    pub fn create_output(&self, id: &str, name: &str, clock: StreamClock) -> Option<SharedOutput> {
        let Some(factory) = self.outputs.get(id) else {
            warn!(id, name, "no output factory registered for id");
            return None;
        };
        debug!(id, name, "creating output");
        Some(factory(name, clock))
    }

    /// Create a filter by id, or `None` when no factory is registered.
    pub fn create_filter(&self, id: &str, name: &str, clock: StreamClock) -> Option<SharedFilter> {
        let Some(factory) = self.filters.get(id) else {
            warn!(id, name, "no filter factory registered for id");
            return None;
        };
        debug!(id, name, "creating filter");
        Some(factory(name, clock))
    }
}

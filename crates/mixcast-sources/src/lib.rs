//! Built-in frame generator sources.
//!
//! These are deliberately thin `Source` implementations used for wiring up
//! scenes before real capture backends exist: a solid-color video generator
//! and a tone/silence audio generator.

mod color;
mod tone;

pub use color::ColorSource;
pub use tone::ToneSource;

use std::sync::Arc;

use parking_lot::Mutex;

use mixcast_core::{SharedSource, StreamClock};

/// Registry id of the solid-color video source.
pub const COLOR_SOURCE_ID: &str = "color";

/// Registry id of the tone audio source.
pub const TONE_SOURCE_ID: &str = "tone";

/// Factory for [`ColorSource`] with default geometry, suitable for
/// registration under [`COLOR_SOURCE_ID`].
pub fn create_color_source(name: &str, clock: StreamClock) -> SharedSource {
    Arc::new(Mutex::new(ColorSource::new(name, clock)))
}

/// Factory for [`ToneSource`] with default tuning, suitable for registration
/// under [`TONE_SOURCE_ID`].
pub fn create_tone_source(name: &str, clock: StreamClock) -> SharedSource {
    Arc::new(Mutex::new(ToneSource::new(name, clock)))
}

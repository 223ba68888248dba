//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ComponentError, ComponentResult};
use crate::frame::MAX_AUDIO_CHANNELS;

/// Video canvas configuration. Scene canvases are RGBA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// Target ticks (composited frames) per second.
    pub fps: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 60,
        }
    }
}

/// Audio mix configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Number of channels.
    pub channels: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
        }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Video canvas settings.
    pub video: VideoSettings,

    /// Audio mix settings.
    pub audio: AudioSettings,
}

impl StreamSettings {
    /// Duration of one streaming tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.video.fps.max(1)))
    }

    /// Audio samples mixed per tick per channel.
    pub fn samples_per_tick(&self) -> usize {
        (self.audio.sample_rate / self.video.fps.max(1)) as usize
    }

    /// Reject configurations the engine cannot tick with.
    pub fn validate(&self) -> ComponentResult<()> {
        if self.video.width == 0 || self.video.height == 0 {
            return Err(ComponentError::Initialization(
                "video canvas must have non-zero dimensions".into(),
            ));
        }
        if self.video.fps == 0 {
            return Err(ComponentError::Initialization(
                "tick rate must be non-zero".into(),
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(ComponentError::Initialization(
                "audio sample rate must be non-zero".into(),
            ));
        }
        if self.audio.channels == 0 || usize::from(self.audio.channels) > MAX_AUDIO_CHANNELS {
            return Err(ComponentError::Initialization(format!(
                "audio channel count must be 1..={MAX_AUDIO_CHANNELS}"
            )));
        }
        if self.samples_per_tick() == 0 {
            return Err(ComponentError::Initialization(
                "tick rate exceeds the audio sample rate".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = StreamSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.video.width, 1920);
        assert_eq!(settings.video.height, 1080);
        assert_eq!(settings.audio.sample_rate, 48000);
    }

    #[test]
    fn test_tick_interval_at_60_fps() {
        let settings = StreamSettings::default();
        let interval = settings.tick_interval();
        assert!(interval >= Duration::from_millis(16));
        assert!(interval < Duration::from_millis(17));
    }

    #[test]
    fn test_samples_per_tick() {
        // 48 kHz at 60 ticks/s is 800 samples per tick.
        assert_eq!(StreamSettings::default().samples_per_tick(), 800);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = StreamSettings::default();
        settings.video.width = 0;
        assert!(settings.validate().is_err());

        let mut settings = StreamSettings::default();
        settings.video.fps = 0;
        assert!(settings.validate().is_err());

        let mut settings = StreamSettings::default();
        settings.audio.channels = 9;
        assert!(settings.validate().is_err());
    }
}

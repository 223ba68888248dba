//! Frame types exchanged between sources, scenes, and the render pipeline.
//!
//! Frames own their storage through reference counting (`Bytes` for video
//! planes, `Arc<[f32]>` for audio planes), so cloning a frame is cheap and a
//! consumer may retain one past the call that delivered it.

use std::sync::Arc;

use bytes::Bytes;

/// Maximum number of planes in a video frame.
pub const MAX_VIDEO_PLANES: usize = 4;

/// Maximum number of channel planes in an audio frame.
pub const MAX_AUDIO_CHANNELS: usize = 8;

/// Pixel layout of a video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, one packed plane, premultiplied alpha.
    Rgba,

    /// 8-bit BGRA, one packed plane, premultiplied alpha.
    Bgra,

    /// 8-bit Y plane plus an interleaved half-height UV plane.
    Nv12,
}

impl PixelFormat {
    /// Number of planes this format carries.
    pub fn plane_count(self) -> usize {
        match self {
            Self::Rgba | Self::Bgra => 1,
            Self::Nv12 => 2,
        }
    }

    /// Minimum stride in bytes for a row of the given width.
    pub fn min_stride(self, width: u32) -> usize {
        match self {
            Self::Rgba | Self::Bgra => width as usize * 4,
            Self::Nv12 => width as usize,
        }
    }

    /// Number of rows the given plane holds for a frame of the given height.
    pub fn plane_rows(self, plane: usize, height: u32) -> usize {
        match (self, plane) {
            (Self::Nv12, 1) => height as usize / 2,
            _ => height as usize,
        }
    }
}

/// One plane of a video frame.
#[derive(Debug, Clone)]
pub struct VideoPlane {
    /// Reference-counted pixel bytes.
    pub data: Bytes,

    /// Bytes per row.
    pub stride: usize,
}

/// A video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Pixel planes; count and layout depend on `format`.
    pub planes: Vec<VideoPlane>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Pixel layout.
    pub format: PixelFormat,

    /// Capture timestamp in microseconds on the engine clock. Monotonically
    /// non-decreasing per source.
    pub timestamp_us: u64,
}

impl VideoFrame {
    /// Create a single-plane packed frame.
    pub fn packed(
        data: Bytes,
        stride: usize,
        width: u32,
        height: u32,
        format: PixelFormat,
        timestamp_us: u64,
    ) -> Self {
        Self {
            planes: vec![VideoPlane { data, stride }],
            width,
            height,
            format,
            timestamp_us,
        }
    }

    /// Validate dimensions, plane count, and per-plane buffer sizes.
    pub fn is_valid(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        if self.planes.is_empty()
            || self.planes.len() > MAX_VIDEO_PLANES
            || self.planes.len() != self.format.plane_count()
        {
            return false;
        }

        let min_stride = self.format.min_stride(self.width);
        self.planes.iter().enumerate().all(|(i, plane)| {
            let rows = self.format.plane_rows(i, self.height);
            plane.stride >= min_stride && plane.data.len() >= plane.stride * rows
        })
    }
}

/// An audio frame holding planar f32 samples.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// One reference-counted sample plane per channel.
    pub planes: Vec<Arc<[f32]>>,

    /// Samples per channel.
    pub samples: usize,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Channel count. Never exceeds the number of populated planes.
    pub channels: u16,

    /// Capture timestamp in microseconds on the engine clock.
    pub timestamp_us: u64,
}

impl AudioFrame {
    /// Validate sample count, channel count, and per-plane lengths.
    pub fn is_valid(&self) -> bool {
        self.samples > 0
            && self.sample_rate > 0
            && self.channels > 0
            && usize::from(self.channels) <= self.planes.len()
            && self.planes.len() <= MAX_AUDIO_CHANNELS
            && self.planes.iter().all(|p| p.len() >= self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_frame(width: u32, height: u32, stride: usize) -> VideoFrame {
        let data = Bytes::from(vec![0u8; stride * height as usize]);
        VideoFrame::packed(data, stride, width, height, PixelFormat::Rgba, 0)
    }

    #[test]
    fn test_packed_frame_is_valid() {
        assert!(rgba_frame(16, 8, 64).is_valid());
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        assert!(!rgba_frame(0, 8, 64).is_valid());
        assert!(!rgba_frame(16, 0, 64).is_valid());
    }

    #[test]
    fn test_short_stride_invalid() {
        // 16 px RGBA needs at least 64 bytes per row.
        assert!(!rgba_frame(16, 8, 32).is_valid());
    }

    #[test]
    fn test_plane_count_must_match_format() {
        let mut frame = rgba_frame(16, 8, 64);
        frame.format = PixelFormat::Nv12;
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_nv12_plane_rows() {
        assert_eq!(PixelFormat::Nv12.plane_rows(0, 100), 100);
        assert_eq!(PixelFormat::Nv12.plane_rows(1, 100), 50);
        assert_eq!(PixelFormat::Rgba.plane_rows(0, 100), 100);
    }

    #[test]
    fn test_audio_frame_validity() {
        let plane: Arc<[f32]> = vec![0.0f32; 480].into();
        let frame = AudioFrame {
            planes: vec![plane.clone(), plane],
            samples: 480,
            sample_rate: 48000,
            channels: 2,
            timestamp_us: 0,
        };
        assert!(frame.is_valid());

        let mut short = frame.clone();
        short.samples = 481;
        assert!(!short.is_valid());

        let mut too_many_channels = frame;
        too_many_channels.channels = 3;
        assert!(!too_many_channels.is_valid());
    }
}

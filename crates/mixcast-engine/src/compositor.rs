//! CPU compositing primitives backing scene render.
//!
//! Video uses premultiplied-alpha source-over blending; audio accumulates
//! samples and clamps once at the end of the mix.

use mixcast_core::{AudioFrame, PixelFormat, VideoFrame};

/// Source-over blend of two premultiplied RGBA pixels.
fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    let inv = 255 - sa;

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Blend `frame` over the canvas at the origin, clipping to the overlap.
///
/// Returns false when the frame cannot be blended (wrong format or invalid
/// layout); the conversion of other pixel formats plugs in here.
pub(crate) fn blit_over(
    canvas: &mut [u8],
    canvas_stride: usize,
    canvas_width: u32,
    canvas_height: u32,
    frame: &VideoFrame,
) -> bool {
    if frame.format != PixelFormat::Rgba || !frame.is_valid() {
        return false;
    }

    let plane = &frame.planes[0];
    let rows = canvas_height.min(frame.height) as usize;
    let cols = canvas_width.min(frame.width) as usize;

    for y in 0..rows {
        let src_row = &plane.data[y * plane.stride..y * plane.stride + cols * 4];
        let dst_row = &mut canvas[y * canvas_stride..y * canvas_stride + cols * 4];
        for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            let blended = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&blended);
        }
    }
    true
}

/// Accumulate `frame` into the planar mix buffers.
///
/// Returns false when the frame cannot be folded in (sample-rate mismatch or
/// invalid layout); resampling plugs in here. Mono frames are duplicated
/// into the extra mix channels.
pub(crate) fn mix_into(acc: &mut [Vec<f32>], sample_rate: u32, frame: &AudioFrame) -> bool {
    if frame.sample_rate != sample_rate || !frame.is_valid() {
        return false;
    }

    let last_frame_channel = usize::from(frame.channels) - 1;
    for (ch, plane) in acc.iter_mut().enumerate() {
        let src = &frame.planes[ch.min(last_frame_channel)];
        let samples = plane.len().min(frame.samples);
        for (dst, s) in plane[..samples].iter_mut().zip(src[..samples].iter()) {
            *dst += *s;
        }
    }
    true
}

/// Clamp accumulated samples to the valid range.
pub(crate) fn clamp_planes(acc: &mut [Vec<f32>]) {
    for plane in acc {
        for sample in plane {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

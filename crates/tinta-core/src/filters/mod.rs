//! Pixel kernels: grayscale and sepia.
//!
//! Kernels are total over well-formed input: a `width` x `height` RGBA8 region
//! of exactly `width * height * 4` bytes, mutated in place. Alpha is never
//! touched.

mod channel;
mod grayscale;
mod sepia;

pub use channel::weighted_sum;
pub use grayscale::{LUMA_WEIGHTS, grayscale, luma};
pub use sepia::{SEPIA_MATRIX, sepia, sepia_pixel};

use crate::image::expected_len;

/// View `bytes` as `width * height` pixels.
///
/// Panics when the slice length disagrees with the dimensions: touching
/// memory outside the pixel region would silently corrupt neighbouring data.
pub(crate) fn pixels_mut(bytes: &mut [u8], width: u32, height: u32) -> &mut [[u8; 4]] {
    let expected = expected_len(width, height);
    assert!(
        expected == Some(bytes.len()),
        "kernel contract violation: {width}x{height} image needs {expected:?} bytes, got {}",
        bytes.len()
    );
    bytemuck::cast_slice_mut(bytes)
}

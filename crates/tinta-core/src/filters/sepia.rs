//! Sepia tone matrix.
//!
//! ```text
//!   R' = 0.393·R + 0.769·G + 0.189·B
//!   G' = 0.349·R + 0.686·G + 0.168·B
//!   B' = 0.272·R + 0.534·G + 0.131·B
//! ```
//!
//! Each output channel is rounded half-up and clamped to 255. The matrix is
//! not a projection, so applying it twice keeps shifting the image.

use super::channel::weighted_sum;
use super::pixels_mut;

/// Rows of the sepia matrix in thousandths, one per output channel.
pub const SEPIA_MATRIX: [[u32; 3]; 3] = [[393, 769, 189], [349, 686, 168], [272, 534, 131]];

/// Sepia-tone a single pixel's color channels.
#[inline]
pub fn sepia_pixel(rgb: [u8; 3]) -> [u8; 3] {
    SEPIA_MATRIX.map(|row| weighted_sum(row, rgb))
}

/// Apply the sepia matrix to a `width` x `height` RGBA8 region in place.
pub fn sepia(bytes: &mut [u8], width: u32, height: u32) {
    for px in pixels_mut(bytes, width, height) {
        let [r, g, b] = sepia_pixel([px[0], px[1], px[2]]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

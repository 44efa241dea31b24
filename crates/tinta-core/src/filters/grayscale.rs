//! Rec. 601 luma grayscale.
//!
//! ```text
//!   L = round(0.299·R + 0.587·G + 0.114·B)
//!   (R, G, B, A) ──→ (L, L, L, A)
//! ```
//!
//! The weights sum to exactly 1.0, so a gray pixel maps to itself and the
//! transform is idempotent.

use super::channel::weighted_sum;
use super::pixels_mut;

/// Luma weights in thousandths.
pub const LUMA_WEIGHTS: [u32; 3] = [299, 587, 114];

/// Luma of a single pixel.
#[inline]
pub fn luma(rgb: [u8; 3]) -> u8 {
    weighted_sum(LUMA_WEIGHTS, rgb)
}

/// Convert a `width` x `height` RGBA8 region to grayscale in place.
pub fn grayscale(bytes: &mut [u8], width: u32, height: u32) {
    for px in pixels_mut(bytes, width, height) {
        let l = luma([px[0], px[1], px[2]]);
        px[0] = l;
        px[1] = l;
        px[2] = l;
    }
}

/// Fixed-point scale of the kernel weights (weights are in thousandths).
pub const WEIGHT_SCALE: u32 = 1000;

/// `round(Σ wᵢ·cᵢ / 1000)` with round-half-up, clamped to `[0, 255]`.
///
/// The kernel coefficients are three-decimal constants, so evaluating them as
/// integer thousandths is exact: half-way sums round up on every target
/// instead of depending on float rounding of `0.299` and friends.
#[inline]
pub fn weighted_sum(weights: [u32; 3], rgb: [u8; 3]) -> u8 {
    let sum = weights[0] * rgb[0] as u32 + weights[1] * rgb[1] as u32 + weights[2] * rgb[2] as u32;
    let rounded = (sum + WEIGHT_SCALE / 2) / WEIGHT_SCALE;
    rounded.min(u8::MAX as u32) as u8
}

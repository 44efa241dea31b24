//! Image representation shared across the host/module boundary.

use serde::{Deserialize, Serialize};

use crate::error::PixelError;

/// Bytes per pixel: red, green, blue, alpha.
pub const CHANNELS: usize = 4;

/// Byte length of a tightly packed RGBA8 image, or `None` on overflow.
pub fn expected_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(CHANNELS)
}

/// Host-owned RGBA8 image.
///
/// Pixels are row-major and interleaved with no row padding, so the byte
/// layout is exactly what the compute module expects in its linear memory.
/// A well-formed buffer holds `width * height * 4` bytes; see
/// [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap `bytes` as a `width` x `height` image, checking the length.
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, PixelError> {
        let buffer = Self::from_raw_parts(width, height, bytes);
        buffer.validate()?;
        Ok(buffer)
    }

    /// Wrap `bytes` without checking the length.
    ///
    /// Decoders hand over whatever they produced; the invoker rejects a
    /// malformed buffer before anything crosses into the compute module.
    pub fn from_raw_parts(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes,
        }
    }

    /// A `width` x `height` image where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let bytes = rgba.repeat(count);
        Self {
            width,
            height,
            bytes,
        }
    }

    /// Check `bytes.len() == width * height * 4`.
    pub fn validate(&self) -> Result<(), PixelError> {
        match expected_len(self.width, self.height) {
            Some(expected) if expected == self.bytes.len() => Ok(()),
            expected => Err(PixelError::InvalidBuffer {
                width: self.width,
                height: self.height,
                expected: expected.unwrap_or(usize::MAX),
                actual: self.bytes.len(),
            }),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of whole pixels stored.
    pub fn pixel_count(&self) -> usize {
        self.bytes.len() / CHANNELS
    }

    /// Raw RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// View the buffer as RGBA pixels. A trailing partial pixel is ignored.
    pub fn pixels(&self) -> &[[u8; 4]] {
        let whole = self.pixel_count() * CHANNELS;
        bytemuck::cast_slice(&self.bytes[..whole])
    }

    /// The pixel at column `x`, row `y`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels().get(index).copied()
    }
}

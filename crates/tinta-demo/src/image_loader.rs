//! Image decoding and encoding for the demo application.

use std::path::Path;

use tinta_core::PixelBuffer;

/// Load an image from disk as an RGBA8 [`PixelBuffer`].
///
/// Supports every format the `image` crate decodes. Gray, RGB and 16-bit
/// sources are converted to 8-bit RGBA; missing alpha becomes opaque.
pub fn load_image(path: &Path) -> Result<PixelBuffer, ImageLoadError> {
    let img = image::open(path).map_err(ImageLoadError::Decode)?;
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PixelBuffer::from_raw_parts(width, height, rgba.into_raw()))
}

/// Encode `buffer` to `path`; the format follows the file extension.
pub fn save_image(path: &Path, buffer: &PixelBuffer) -> Result<(), ImageLoadError> {
    let malformed = || ImageLoadError::Malformed {
        width: buffer.width(),
        height: buffer.height(),
        len: buffer.as_bytes().len(),
    };
    buffer.validate().map_err(|_| malformed())?;
    let rgba = image::RgbaImage::from_raw(
        buffer.width(),
        buffer.height(),
        buffer.as_bytes().to_vec(),
    )
    .ok_or_else(malformed)?;
    rgba.save(path).map_err(ImageLoadError::Encode)
}

/// Errors that can occur during image loading and saving.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("{len} bytes do not form a {width}x{height} RGBA image")]
    Malformed { width: u32, height: u32, len: usize },
}

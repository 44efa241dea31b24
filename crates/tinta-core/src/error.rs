/// Errors raised by the pixel data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelError {
    #[error("invalid {width}x{height} buffer: expected {expected} bytes, got {actual}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        /// Saturates to `usize::MAX` when `width * height * 4` overflows.
        expected: usize,
        actual: usize,
    },
    #[error("unknown kernel: {0:?}")]
    UnknownKernel(String),
}

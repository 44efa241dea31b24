//! Tinta Core — pixel data model and filter kernels.
//!
//! This crate contains the RGBA8 buffer representation shared by the host and
//! the compute module, plus the grayscale and sepia kernels. No I/O and no
//! knowledge of where the bytes live.

pub mod error;
pub mod filters;
pub mod image;
pub mod kernel;

// Re-exports for convenience.
pub use error::PixelError;
pub use filters::{grayscale, sepia};
pub use image::{CHANNELS, PixelBuffer, expected_len};
pub use kernel::Kernel;

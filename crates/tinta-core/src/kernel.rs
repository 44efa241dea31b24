//! Identifiers for the transforms the compute module exports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PixelError;

/// A pixel transform implemented by the compute module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// Rec. 601 luma, replicated into R, G and B.
    Grayscale,
    /// Classic warm-brown tone matrix.
    Sepia,
}

impl Kernel {
    /// All kernels, in export order.
    pub const ALL: [Kernel; 2] = [Kernel::Grayscale, Kernel::Sepia];

    /// Export name of the kernel in the compute module.
    pub fn name(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
        }
    }

    /// Run the kernel on `bytes`, a `width` x `height` RGBA8 region.
    pub fn run(self, bytes: &mut [u8], width: u32, height: u32) {
        match self {
            Self::Grayscale => crate::filters::grayscale(bytes, width, height),
            Self::Sepia => crate::filters::sepia(bytes, width, height),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kernel| kernel.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PixelError::UnknownKernel(s.to_string()))
    }
}

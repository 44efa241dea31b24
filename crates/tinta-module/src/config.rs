//! Linear memory sizing.

use serde::{Deserialize, Serialize};

use crate::memory::PAGE_SIZE;

/// Pages mapped when the module starts (1 MiB).
const DEFAULT_INITIAL_PAGES: u32 = 16;
/// Growth ceiling (1 GiB), enough for a 16k x 16k RGBA8 photo.
const DEFAULT_MAX_PAGES: u32 = 16_384;
/// A 32-bit address space holds at most this many 64 KiB pages.
pub(crate) const ADDRESS_SPACE_PAGES: u32 = 65_536;

/// Sizing of a module's linear memory, in 64 KiB pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Pages available before the first allocation.
    pub initial_pages: u32,
    /// Upper bound for on-demand growth; allocations beyond it fail.
    pub max_pages: u32,
}

impl ModuleConfig {
    /// `initial_pages` and `max_pages` clamped to the 32-bit address space,
    /// with `initial_pages <= max_pages`.
    pub fn normalized(self) -> Self {
        let max_pages = self.max_pages.clamp(1, ADDRESS_SPACE_PAGES);
        Self {
            initial_pages: self.initial_pages.clamp(1, max_pages),
            max_pages,
        }
    }

    /// Largest linear memory this configuration allows, in bytes.
    pub fn max_bytes(&self) -> usize {
        self.normalized().max_pages as usize * PAGE_SIZE
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            initial_pages: DEFAULT_INITIAL_PAGES,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

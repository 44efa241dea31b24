//! Linear memory and its malloc-style allocator.
//!
//! The memory is one contiguous byte region grown in 64 KiB pages, like a
//! wasm memory. Blocks are handed out first-fit from a free list keyed by
//! offset; releasing a block merges it with free neighbours so a long run of
//! same-sized allocate/release cycles never fragments the region.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::config::ModuleConfig;

/// Size of one linear memory page.
pub const PAGE_SIZE: usize = 64 * 1024;

/// Alignment of every block handed out.
pub const ALIGN: u32 = 8;

/// The null pointer. Never handed out; the first `ALIGN` bytes are reserved.
pub const NULL: u32 = 0;

/// A growable byte region with a first-fit block allocator.
#[derive(Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    max_pages: u32,
    /// Free blocks: offset -> length.
    free: BTreeMap<u32, u32>,
    /// Live blocks: offset -> length (rounded up to `ALIGN`).
    live: BTreeMap<u32, u32>,
}

impl LinearMemory {
    pub fn new(config: ModuleConfig) -> Self {
        let config = config.normalized();
        let capacity = config.initial_pages as usize * PAGE_SIZE;
        let mut memory = Self {
            bytes: vec![0; capacity],
            max_pages: config.max_pages,
            free: BTreeMap::new(),
            live: BTreeMap::new(),
        };
        memory.insert_free(ALIGN, capacity as u64 - ALIGN as u64);
        memory
    }

    /// Current size of the region in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Current size of the region in pages.
    pub fn pages(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE) as u32
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Number of blocks allocated and not yet released.
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    /// Bytes held by live blocks, including alignment padding.
    pub fn bytes_in_use(&self) -> usize {
        self.live.values().map(|&len| len as usize).sum()
    }

    /// Length of the live block starting at `ptr`.
    pub fn block_len(&self, ptr: u32) -> Option<u32> {
        self.live.get(&ptr).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Byte range `ptr..ptr + len`, if it lies inside the memory.
    pub fn range(&self, ptr: u32, len: usize) -> Option<Range<usize>> {
        let start = ptr as usize;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }

    /// Reserve `size` bytes, growing the memory if needed. Returns [`NULL`]
    /// when the request exceeds the page budget.
    pub fn allocate(&mut self, size: u32) -> u32 {
        let Some(len) = block_len_for(size) else {
            tracing::warn!(size, "allocation size overflows the address space");
            return NULL;
        };

        if let Some(ptr) = self.take_first_fit(len) {
            return ptr;
        }
        if !self.grow_for(len) {
            tracing::warn!(
                size,
                pages = self.pages(),
                max_pages = self.max_pages,
                "linear memory exhausted"
            );
            return NULL;
        }
        self.take_first_fit(len).unwrap_or(NULL)
    }

    /// Return a block to the free list. Null and unknown pointers are ignored.
    pub fn release(&mut self, ptr: u32) {
        if ptr == NULL {
            return;
        }
        match self.live.remove(&ptr) {
            Some(len) => self.insert_free(ptr, len as u64),
            None => tracing::warn!(ptr, "release of a pointer that is not allocated"),
        }
    }

    fn take_first_fit(&mut self, len: u32) -> Option<u32> {
        let (&ptr, &block) = self.free.iter().find(|&(_, &block)| block >= len)?;
        self.free.remove(&ptr);
        if block > len {
            self.free.insert(ptr + len, block - len);
        }
        self.live.insert(ptr, len);
        tracing::trace!(ptr, len, "block allocated");
        Some(ptr)
    }

    /// Add pages so that a block of `len` bytes fits at the end of memory.
    fn grow_for(&mut self, len: u32) -> bool {
        let capacity = self.bytes.len() as u64;
        // A free block touching the end of memory absorbs part of the request.
        let tail = self
            .free
            .iter()
            .next_back()
            .filter(|&(&ptr, &block)| ptr as u64 + block as u64 == capacity)
            .map_or(0, |(_, &block)| block as u64);
        let needed = len as u64 - tail;
        let extra_pages = needed.div_ceil(PAGE_SIZE as u64);
        let new_pages = self.pages() as u64 + extra_pages;
        if new_pages > self.max_pages as u64 {
            return false;
        }

        let new_capacity = new_pages as usize * PAGE_SIZE;
        self.bytes.resize(new_capacity, 0);
        self.insert_free(capacity as u32, new_capacity as u64 - capacity);
        tracing::debug!(pages = new_pages, "linear memory grown");
        true
    }

    /// Insert a free block, merging it with adjacent free blocks.
    fn insert_free(&mut self, ptr: u32, len: u64) {
        let mut start = ptr as u64;
        let mut end = start + len;

        let prev = self.free.range(..ptr).next_back().map(|(&p, &len)| (p, len));
        if let Some((prev, prev_len)) = prev {
            if prev as u64 + prev_len as u64 == start {
                self.free.remove(&prev);
                start = prev as u64;
            }
        }
        if let Ok(next) = u32::try_from(end) {
            if let Some(next_len) = self.free.remove(&next) {
                end += next_len as u64;
            }
        }

        // The region tops out at 4 GiB, so a single block never reaches it.
        self.free.insert(start as u32, (end - start) as u32);
    }
}

impl Default for LinearMemory {
    fn default() -> Self {
        Self::new(ModuleConfig::default())
    }
}

/// `size` rounded up to a non-empty multiple of [`ALIGN`].
fn block_len_for(size: u32) -> Option<u32> {
    size.max(1).checked_next_multiple_of(ALIGN)
}

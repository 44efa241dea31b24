//! Arena primitives over a compute module's linear memory.

use tinta_core::Kernel;

use crate::error::ArenaError;

/// A block of the module's linear memory. Valid until freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaAllocation {
    pub offset: usize,
    pub size: usize,
}

impl ArenaAllocation {
    /// Whether `len` bytes starting at the block's offset stay inside it.
    pub fn holds(&self, len: usize) -> bool {
        len <= self.size
    }
}

/// allocate / write / read / free over a flat byte region.
///
/// Every successful `allocate` must be matched by exactly one `free`; prefer
/// [`ScopedAllocation`], which does that on drop.
pub trait MemoryArena {
    fn allocate(&mut self, size: usize) -> Result<ArenaAllocation, ArenaError>;

    /// Copy `bytes` to the start of `allocation`.
    fn write(&mut self, allocation: &ArenaAllocation, bytes: &[u8]) -> Result<(), ArenaError>;

    /// Copy `len` bytes out of the start of `allocation`.
    fn read(&self, allocation: &ArenaAllocation, len: usize) -> Result<Vec<u8>, ArenaError>;

    fn free(&mut self, allocation: ArenaAllocation) -> Result<(), ArenaError>;
}

/// An arena whose owner can run pixel kernels on its blocks.
pub trait KernelDispatch: MemoryArena {
    /// Run `kernel` in place on the `width` x `height` image at the start of
    /// `allocation`.
    fn dispatch(
        &mut self,
        kernel: Kernel,
        allocation: &ArenaAllocation,
        width: u32,
        height: u32,
    ) -> Result<(), ArenaError>;
}

/// An arena block released when the guard drops.
///
/// The guard borrows the arena mutably for its whole life, so no other block
/// can be written through the same arena while it is held.
pub struct ScopedAllocation<'a, A: MemoryArena + ?Sized> {
    arena: &'a mut A,
    allocation: ArenaAllocation,
}

impl<'a, A: MemoryArena + ?Sized> ScopedAllocation<'a, A> {
    /// Allocate `size` bytes from `arena`. On failure nothing is held.
    pub fn new(arena: &'a mut A, size: usize) -> Result<Self, ArenaError> {
        let allocation = arena.allocate(size)?;
        Ok(Self { arena, allocation })
    }

    pub fn allocation(&self) -> ArenaAllocation {
        self.allocation
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ArenaError> {
        self.arena.write(&self.allocation, bytes)
    }

    pub fn read(&self, len: usize) -> Result<Vec<u8>, ArenaError> {
        self.arena.read(&self.allocation, len)
    }
}

impl<A: KernelDispatch + ?Sized> ScopedAllocation<'_, A> {
    pub fn dispatch(&mut self, kernel: Kernel, width: u32, height: u32) -> Result<(), ArenaError> {
        self.arena.dispatch(kernel, &self.allocation, width, height)
    }
}

impl<A: MemoryArena + ?Sized> Drop for ScopedAllocation<'_, A> {
    fn drop(&mut self) {
        if let Err(err) = self.arena.free(self.allocation) {
            tracing::error!(
                offset = self.allocation.offset,
                size = self.allocation.size,
                "failed to release arena block: {err}"
            );
        }
    }
}

//! [`MemoryArena`] over a compute module's exported ABI.

use std::collections::HashMap;
use std::ops::Range;

use tinta_core::{Kernel, expected_len};
use tinta_module::{ModuleAbi, NULL};

use crate::arena::{ArenaAllocation, KernelDispatch, MemoryArena};
use crate::error::ArenaError;

/// Wraps a [`ModuleAbi`] and polices every access against the blocks it has
/// handed out.
///
/// The module itself only traps when an access leaves its memory entirely;
/// this wrapper also refuses accesses that leave a block, double frees and
/// kernel calls sized past their block. Refused operations are logged and
/// never reach the module.
#[derive(Debug)]
pub struct ModuleArena<M> {
    module: M,
    /// Live blocks: offset -> requested size.
    live: HashMap<usize, usize>,
}

impl<M: ModuleAbi> ModuleArena<M> {
    pub fn new(module: M) -> Self {
        Self {
            module,
            live: HashMap::new(),
        }
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn into_inner(self) -> M {
        self.module
    }

    /// Blocks allocated through this arena and not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    /// Byte range of `len` bytes at the start of a live `allocation`.
    fn checked_range(
        &self,
        op: &str,
        allocation: &ArenaAllocation,
        len: usize,
    ) -> Result<Range<usize>, ArenaError> {
        let Some(&size) = self.live.get(&allocation.offset) else {
            return Err(violation(format!(
                "{op} on block {:#x} that is not allocated",
                allocation.offset
            )));
        };
        if !allocation.holds(len) || len > size {
            return Err(violation(format!(
                "{op} of {len} bytes overruns block {:#x} of {size} bytes",
                allocation.offset
            )));
        }
        let start = allocation.offset;
        let end = start + len;
        if end > self.module.memory().len() {
            return Err(violation(format!(
                "{op} of {len} bytes at {start:#x} leaves linear memory"
            )));
        }
        Ok(start..end)
    }
}

impl<M: ModuleAbi> MemoryArena for ModuleArena<M> {
    fn allocate(&mut self, size: usize) -> Result<ArenaAllocation, ArenaError> {
        let requested = u32::try_from(size).map_err(|_| ArenaError::OutOfCapacity { requested: size })?;
        let ptr = self.module.allocate(requested);
        if ptr == NULL {
            return Err(ArenaError::OutOfCapacity { requested: size });
        }

        let offset = ptr as usize;
        self.live.insert(offset, size);
        tracing::trace!(offset, size, "arena block allocated");
        Ok(ArenaAllocation { offset, size })
    }

    fn write(&mut self, allocation: &ArenaAllocation, bytes: &[u8]) -> Result<(), ArenaError> {
        let range = self.checked_range("write", allocation, bytes.len())?;
        self.module.memory_mut()[range].copy_from_slice(bytes);
        Ok(())
    }

    fn read(&self, allocation: &ArenaAllocation, len: usize) -> Result<Vec<u8>, ArenaError> {
        let range = self.checked_range("read", allocation, len)?;
        Ok(self.module.memory()[range].to_vec())
    }

    fn free(&mut self, allocation: ArenaAllocation) -> Result<(), ArenaError> {
        if self.live.remove(&allocation.offset).is_none() {
            return Err(violation(format!(
                "free of block {:#x} that is not allocated",
                allocation.offset
            )));
        }
        self.module.release(allocation.offset as u32);
        tracing::trace!(offset = allocation.offset, "arena block released");
        Ok(())
    }
}

impl<M: ModuleAbi> KernelDispatch for ModuleArena<M> {
    fn dispatch(
        &mut self,
        kernel: Kernel,
        allocation: &ArenaAllocation,
        width: u32,
        height: u32,
    ) -> Result<(), ArenaError> {
        let Some(len) = expected_len(width, height) else {
            return Err(violation(format!(
                "{kernel} dimensions {width}x{height} overflow"
            )));
        };
        self.checked_range(kernel.name(), allocation, len)?;
        self.module
            .invoke(kernel, allocation.offset as u32, width, height);
        Ok(())
    }
}

fn violation(detail: String) -> ArenaError {
    tracing::error!("arena contract violation: {detail}");
    ArenaError::ContractViolation(detail)
}

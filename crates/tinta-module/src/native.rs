use tinta_core::{Kernel, expected_len};

use crate::abi::ModuleAbi;
use crate::config::ModuleConfig;
use crate::memory::LinearMemory;

/// The compute module running in-process over its own [`LinearMemory`].
#[derive(Debug, Default)]
pub struct NativeModule {
    memory: LinearMemory,
}

impl NativeModule {
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            memory: LinearMemory::new(config),
        }
    }

    /// The module's linear memory, for allocator statistics.
    pub fn linear_memory(&self) -> &LinearMemory {
        &self.memory
    }

    fn run(&mut self, kernel: Kernel, ptr: u32, width: u32, height: u32) {
        let region = expected_len(width, height).and_then(|len| self.memory.range(ptr, len));
        let Some(region) = region else {
            // Same outcome as an out-of-bounds access inside a wasm module.
            panic!(
                "trap: {kernel} at {ptr:#x} for {width}x{height} runs past linear memory ({} bytes)",
                self.memory.capacity()
            );
        };
        tracing::trace!(%kernel, ptr, width, height, "kernel call");
        kernel.run(&mut self.memory.as_mut_slice()[region], width, height);
    }
}

impl ModuleAbi for NativeModule {
    fn allocate(&mut self, size: u32) -> u32 {
        self.memory.allocate(size)
    }

    fn release(&mut self, ptr: u32) {
        self.memory.release(ptr);
    }

    fn grayscale(&mut self, ptr: u32, width: u32, height: u32) {
        self.run(Kernel::Grayscale, ptr, width, height);
    }

    fn sepia(&mut self, ptr: u32, width: u32, height: u32) {
        self.run(Kernel::Sepia, ptr, width, height);
    }

    fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.as_mut_slice()
    }
}

use tinta_core::Kernel;

/// The compute module's exported surface.
///
/// Pointers are 32-bit offsets into [`memory`](Self::memory); `0` is null.
/// Kernels take the pointer of a region holding `width * height * 4` bytes
/// and mutate it in place. They return nothing and cannot fail on
/// well-formed input; a region that runs past the end of memory traps.
pub trait ModuleAbi {
    /// Reserve `size` bytes. Returns null when the request cannot be met.
    fn allocate(&mut self, size: u32) -> u32;

    /// Release a pointer returned by [`allocate`](Self::allocate).
    fn release(&mut self, ptr: u32);

    fn grayscale(&mut self, ptr: u32, width: u32, height: u32);

    fn sepia(&mut self, ptr: u32, width: u32, height: u32);

    /// The whole linear memory.
    fn memory(&self) -> &[u8];

    fn memory_mut(&mut self) -> &mut [u8];

    /// Call the export matching `kernel`.
    fn invoke(&mut self, kernel: Kernel, ptr: u32, width: u32, height: u32) {
        match kernel {
            Kernel::Grayscale => self.grayscale(ptr, width, height),
            Kernel::Sepia => self.sepia(ptr, width, height),
        }
    }
}

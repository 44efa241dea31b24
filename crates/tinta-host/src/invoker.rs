//! Transform invocation across the compute-module boundary.
//!
//! One call moves a buffer through the module's linear memory:
//!
//! ```text
//!   PixelBuffer ──→ allocate ──→ write ──→ kernel(ptr, w, h) ──→ read ──→ PixelBuffer
//!                      └─────────────── release on every exit ───────────────┘
//! ```

use std::time::Duration;

use parking_lot::MutexGuard;
use tinta_core::{Kernel, PixelBuffer};

use crate::arena::{KernelDispatch, ScopedAllocation};
use crate::config::{ContentionPolicy, InvokerConfig};
use crate::error::TransformError;
use crate::readiness::ModuleHandle;

/// Runs kernels on pixel buffers through a compute module, one call at a time.
///
/// The module is an explicit dependency: each invoker holds a handle to the
/// module it drives, and invokers sharing a handle serialize against each
/// other according to [`ContentionPolicy`].
pub struct TransformInvoker<A> {
    module: ModuleHandle<A>,
    config: InvokerConfig,
}

impl<A: KernelDispatch> TransformInvoker<A> {
    pub fn new(module: ModuleHandle<A>, config: InvokerConfig) -> Self {
        Self { module, config }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    pub fn handle(&self) -> &ModuleHandle<A> {
        &self.module
    }

    /// Whether no call is in flight. A module that has not loaded is idle.
    pub fn is_idle(&self) -> bool {
        self.module
            .module()
            .is_none_or(|module| !module.is_locked())
    }

    /// Apply `kernel` to a copy of `buffer` and return the result.
    ///
    /// `buffer` is only borrowed; on error it is exactly as it was.
    pub fn apply(&self, kernel: Kernel, buffer: &PixelBuffer) -> Result<PixelBuffer, TransformError> {
        let span = tracing::debug_span!(
            "apply",
            %kernel,
            width = buffer.width(),
            height = buffer.height()
        );
        let _enter = span.enter();

        let result = self.apply_inner(kernel, buffer);
        match &result {
            Ok(_) => tracing::debug!("transform complete"),
            Err(err @ TransformError::ContractViolation(_)) => tracing::error!("transform failed: {err}"),
            Err(err) => tracing::warn!("transform refused: {err}"),
        }
        result
    }

    /// Apply `kernel` and replace `buffer` with the result on success.
    pub fn apply_in_place(&self, kernel: Kernel, buffer: &mut PixelBuffer) -> Result<(), TransformError> {
        *buffer = self.apply(kernel, buffer)?;
        Ok(())
    }

    fn apply_inner(&self, kernel: Kernel, buffer: &PixelBuffer) -> Result<PixelBuffer, TransformError> {
        if !self.module.is_ready() && self.config.ready_timeout_ms > 0 {
            self.module.wait_timeout(self.config.ready_timeout());
        }
        let module = self.module.module().ok_or(TransformError::NotReady)?;

        buffer.validate()?;

        let mut arena = match self.config.contention {
            ContentionPolicy::Wait => module.lock(),
            ContentionPolicy::WaitFor { timeout_ms } => module
                .try_lock_for(Duration::from_millis(timeout_ms))
                .ok_or(TransformError::Busy)?,
            ContentionPolicy::Reject => module.try_lock().ok_or(TransformError::Busy)?,
        };

        transform(&mut arena, kernel, buffer)
    }
}

/// allocate → write → dispatch → read, with the block released on drop.
fn transform<A: KernelDispatch>(
    arena: &mut MutexGuard<'_, A>,
    kernel: Kernel,
    buffer: &PixelBuffer,
) -> Result<PixelBuffer, TransformError> {
    let len = buffer.as_bytes().len();
    let mut block = ScopedAllocation::new(&mut **arena, len)?;
    block.write(buffer.as_bytes())?;
    block.dispatch(kernel, buffer.width(), buffer.height())?;
    let bytes = block.read(len)?;
    Ok(PixelBuffer::from_raw_parts(buffer.width(), buffer.height(), bytes))
}

#[cfg(test)]
mod tests {
    use tinta_module::{ModuleConfig, NativeModule};

    use super::*;
    use crate::module_arena::ModuleArena;
    use crate::readiness;

    fn invoker(config: InvokerConfig) -> TransformInvoker<ModuleArena<NativeModule>> {
        let arena = ModuleArena::new(NativeModule::new(ModuleConfig {
            initial_pages: 1,
            max_pages: 4,
        }));
        TransformInvoker::new(ModuleHandle::ready(arena), config)
    }

    fn live_blocks(invoker: &TransformInvoker<ModuleArena<NativeModule>>) -> usize {
        invoker
            .handle()
            .lock()
            .map_or(0, |arena| arena.module().linear_memory().live_allocations())
    }

    #[test]
    fn test_grayscale_red() {
        let invoker = invoker(InvokerConfig::default());
        let red = PixelBuffer::filled(2, 2, [255, 0, 0, 255]);
        let gray = invoker.apply(Kernel::Grayscale, &red).unwrap();
        assert_eq!(gray, PixelBuffer::filled(2, 2, [76, 76, 76, 255]));
        assert_eq!(red, PixelBuffer::filled(2, 2, [255, 0, 0, 255]));
        assert_eq!(live_blocks(&invoker), 0);
        assert!(invoker.is_idle());
    }

    #[test]
    fn test_sepia_white() {
        let invoker = invoker(InvokerConfig::default());
        let white = PixelBuffer::filled(1, 1, [255, 255, 255, 255]);
        let toned = invoker.apply(Kernel::Sepia, &white).unwrap();
        assert_eq!(toned.as_bytes(), &[255, 255, 239, 255]);
    }

    #[test]
    fn test_invalid_buffer_rejected() {
        let invoker = invoker(InvokerConfig::default());
        let bad = PixelBuffer::from_raw_parts(2, 2, vec![0; 12]);
        let err = invoker.apply(Kernel::Grayscale, &bad).unwrap_err();
        assert!(matches!(err, TransformError::InvalidBuffer(_)));
        assert_eq!(bad.as_bytes(), &[0; 12]);
    }

    #[test]
    fn test_not_ready() {
        let (loader, handle) = readiness::channel::<ModuleArena<NativeModule>>();
        let invoker = TransformInvoker::new(handle, InvokerConfig::default());
        let buffer = PixelBuffer::filled(1, 1, [1, 2, 3, 4]);
        assert_eq!(
            invoker.apply(Kernel::Sepia, &buffer),
            Err(TransformError::NotReady)
        );
        assert!(invoker.is_idle());

        loader.complete(ModuleArena::new(NativeModule::default()));
        assert!(invoker.apply(Kernel::Sepia, &buffer).is_ok());
    }

    #[test]
    fn test_allocation_failure() {
        let invoker = invoker(InvokerConfig::default());
        let huge = PixelBuffer::filled(512, 512, [0, 0, 0, 255]);
        let err = invoker.apply(Kernel::Grayscale, &huge).unwrap_err();
        assert_eq!(
            err,
            TransformError::Allocation {
                requested: 512 * 512 * 4
            }
        );
        assert_eq!(live_blocks(&invoker), 0);
    }

    #[test]
    fn test_reject_while_locked() {
        let invoker = invoker(InvokerConfig {
            contention: ContentionPolicy::Reject,
            ..Default::default()
        });
        let buffer = PixelBuffer::filled(1, 1, [1, 2, 3, 4]);
        let guard = invoker.handle().lock();
        assert!(!invoker.is_idle());
        assert_eq!(
            invoker.apply(Kernel::Grayscale, &buffer),
            Err(TransformError::Busy)
        );
        drop(guard);
        assert!(invoker.apply(Kernel::Grayscale, &buffer).is_ok());
    }

    #[test]
    fn test_wait_for_times_out() {
        let invoker = invoker(InvokerConfig {
            contention: ContentionPolicy::WaitFor { timeout_ms: 10 },
            ..Default::default()
        });
        let buffer = PixelBuffer::filled(1, 1, [1, 2, 3, 4]);
        let _guard = invoker.handle().lock();
        assert_eq!(
            invoker.apply(Kernel::Sepia, &buffer),
            Err(TransformError::Busy)
        );
    }

    #[test]
    fn test_apply_in_place_only_on_success() {
        let invoker = invoker(InvokerConfig::default());
        let mut buffer = PixelBuffer::filled(1, 1, [255, 0, 0, 9]);
        invoker.apply_in_place(Kernel::Grayscale, &mut buffer).unwrap();
        assert_eq!(buffer.as_bytes(), &[76, 76, 76, 9]);

        let mut bad = PixelBuffer::from_raw_parts(1, 1, vec![1, 2, 3]);
        assert!(invoker.apply_in_place(Kernel::Grayscale, &mut bad).is_err());
        assert_eq!(bad.as_bytes(), &[1, 2, 3]);
    }
}

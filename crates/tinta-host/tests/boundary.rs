//! Invoker behaviour across the module boundary: leaks, faults, contention.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use tinta_core::{Kernel, PixelBuffer};
use tinta_host::readiness::channel;
use tinta_host::{
    ArenaAllocation, ArenaError, InvokerConfig, KernelDispatch, MemoryArena, ModuleArena,
    ModuleHandle, TransformError, TransformInvoker,
};
use tinta_module::{ModuleAbi, ModuleConfig, NativeModule};

/// Counts every ABI call that reaches the module.
#[derive(Default)]
struct CountingModule {
    inner: NativeModule,
    calls: usize,
    allocations: usize,
    releases: usize,
}

impl ModuleAbi for CountingModule {
    fn allocate(&mut self, size: u32) -> u32 {
        self.calls += 1;
        self.allocations += 1;
        self.inner.allocate(size)
    }

    fn release(&mut self, ptr: u32) {
        self.calls += 1;
        self.releases += 1;
        self.inner.release(ptr);
    }

    fn grayscale(&mut self, ptr: u32, width: u32, height: u32) {
        self.calls += 1;
        self.inner.grayscale(ptr, width, height);
    }

    fn sepia(&mut self, ptr: u32, width: u32, height: u32) {
        self.calls += 1;
        self.inner.sepia(ptr, width, height);
    }

    fn memory(&self) -> &[u8] {
        self.inner.memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.inner.memory_mut()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Write,
    Dispatch,
    Read,
    KernelPanic,
}

/// Arena that fails at one chosen step of a transform.
struct FaultyArena {
    inner: ModuleArena<NativeModule>,
    fault: Fault,
    allocations: usize,
    frees: usize,
}

impl FaultyArena {
    fn new(fault: Fault) -> Self {
        Self {
            inner: ModuleArena::new(NativeModule::default()),
            fault,
            allocations: 0,
            frees: 0,
        }
    }

    fn injected(&self, step: Fault) -> Result<(), ArenaError> {
        if self.fault == step {
            return Err(ArenaError::ContractViolation(format!("injected {step:?} fault")));
        }
        Ok(())
    }
}

impl MemoryArena for FaultyArena {
    fn allocate(&mut self, size: usize) -> Result<ArenaAllocation, ArenaError> {
        let allocation = self.inner.allocate(size)?;
        self.allocations += 1;
        Ok(allocation)
    }

    fn write(&mut self, allocation: &ArenaAllocation, bytes: &[u8]) -> Result<(), ArenaError> {
        self.injected(Fault::Write)?;
        self.inner.write(allocation, bytes)
    }

    fn read(&self, allocation: &ArenaAllocation, len: usize) -> Result<Vec<u8>, ArenaError> {
        self.injected(Fault::Read)?;
        self.inner.read(allocation, len)
    }

    fn free(&mut self, allocation: ArenaAllocation) -> Result<(), ArenaError> {
        self.frees += 1;
        self.inner.free(allocation)
    }
}

impl KernelDispatch for FaultyArena {
    fn dispatch(
        &mut self,
        kernel: Kernel,
        allocation: &ArenaAllocation,
        width: u32,
        height: u32,
    ) -> Result<(), ArenaError> {
        if self.fault == Fault::KernelPanic {
            panic!("injected kernel panic");
        }
        self.injected(Fault::Dispatch)?;
        self.inner.dispatch(kernel, allocation, width, height)
    }
}

fn native_invoker() -> TransformInvoker<ModuleArena<NativeModule>> {
    TransformInvoker::new(
        ModuleHandle::ready(ModuleArena::new(NativeModule::default())),
        InvokerConfig::default(),
    )
}

#[test]
fn every_fault_releases_the_block() {
    let buffer = PixelBuffer::filled(3, 2, [200, 100, 50, 7]);
    for fault in [Fault::Write, Fault::Dispatch, Fault::Read] {
        let invoker = TransformInvoker::new(
            ModuleHandle::ready(FaultyArena::new(fault)),
            InvokerConfig::default(),
        );
        let err = invoker.apply(Kernel::Sepia, &buffer).unwrap_err();
        assert!(matches!(err, TransformError::ContractViolation(_)), "{fault:?}");
        assert_eq!(buffer, PixelBuffer::filled(3, 2, [200, 100, 50, 7]));

        let arena = invoker.handle().lock().unwrap();
        assert_eq!(arena.allocations, 1, "{fault:?}");
        assert_eq!(arena.frees, 1, "{fault:?}");
        assert_eq!(arena.inner.live_allocations(), 0, "{fault:?}");
    }
}

#[test]
fn kernel_panic_still_releases_the_block() {
    let invoker = TransformInvoker::new(
        ModuleHandle::ready(FaultyArena::new(Fault::KernelPanic)),
        InvokerConfig::default(),
    );
    let buffer = PixelBuffer::filled(2, 2, [1, 2, 3, 4]);
    let outcome = catch_unwind(AssertUnwindSafe(|| invoker.apply(Kernel::Grayscale, &buffer)));
    assert!(outcome.is_err());
    assert_eq!(buffer, PixelBuffer::filled(2, 2, [1, 2, 3, 4]));

    let arena = invoker.handle().lock().unwrap();
    assert_eq!(arena.allocations, 1);
    assert_eq!(arena.frees, 1);
    assert_eq!(arena.inner.live_allocations(), 0);
}

#[test]
fn invalid_buffer_never_reaches_the_module() {
    let invoker = TransformInvoker::new(
        ModuleHandle::ready(ModuleArena::new(CountingModule::default())),
        InvokerConfig::default(),
    );
    let bad = PixelBuffer::from_raw_parts(4, 4, vec![9; 63]);
    let err = invoker.apply(Kernel::Grayscale, &bad).unwrap_err();
    assert!(matches!(err, TransformError::InvalidBuffer(_)));
    assert_eq!(invoker.handle().lock().unwrap().module().calls, 0);
}

#[test]
fn successful_calls_balance_allocate_and_release() {
    let invoker = TransformInvoker::new(
        ModuleHandle::ready(ModuleArena::new(CountingModule::default())),
        InvokerConfig::default(),
    );
    let buffer = PixelBuffer::filled(8, 8, [10, 20, 30, 40]);
    for kernel in [Kernel::Grayscale, Kernel::Sepia, Kernel::Grayscale] {
        invoker.apply(kernel, &buffer).unwrap();
    }
    let arena = invoker.handle().lock().unwrap();
    assert_eq!(arena.module().allocations, 3);
    assert_eq!(arena.module().releases, 3);
    assert_eq!(arena.live_allocations(), 0);
}

#[test]
fn zero_sized_image_round_trips() {
    let invoker = native_invoker();
    let empty = PixelBuffer::new(0, 0, Vec::new()).unwrap();
    assert_eq!(invoker.apply(Kernel::Sepia, &empty).unwrap(), empty);
}

#[test]
fn concurrent_callers_are_serialized() {
    let invoker = Arc::new(native_invoker());
    let workers: Vec<_> = (0..8u8)
        .map(|i| {
            let invoker = Arc::clone(&invoker);
            thread::spawn(move || {
                let buffer = PixelBuffer::filled(16, 16, [i * 30, 255 - i, i, 255]);
                let expected = {
                    let mut bytes = buffer.as_bytes().to_vec();
                    Kernel::Sepia.run(&mut bytes, 16, 16);
                    bytes
                };
                for _ in 0..20 {
                    let out = invoker.apply(Kernel::Sepia, &buffer).unwrap();
                    assert_eq!(out.as_bytes(), expected.as_slice());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    let arena = invoker.handle().lock().unwrap();
    assert_eq!(arena.live_allocations(), 0);
}

#[test]
fn waits_for_late_module() {
    let (loader, handle) = channel();
    let invoker = TransformInvoker::new(
        handle,
        InvokerConfig {
            ready_timeout_ms: 10_000,
            ..Default::default()
        },
    );
    let loading = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(20));
        loader.complete(ModuleArena::new(NativeModule::new(ModuleConfig::default())));
    });
    let red = PixelBuffer::filled(1, 1, [255, 0, 0, 255]);
    let gray = invoker.apply(Kernel::Grayscale, &red).unwrap();
    assert_eq!(gray.as_bytes(), &[76, 76, 76, 255]);
    loading.join().unwrap();
}

fn arb_buffer() -> impl Strategy<Value = PixelBuffer> {
    (0u32..10, 0u32..10).prop_flat_map(|(w, h)| {
        proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |bytes| PixelBuffer::new(w, h, bytes).unwrap())
    })
}

fn arb_malformed() -> impl Strategy<Value = PixelBuffer> {
    (1u32..10, 1u32..10, proptest::collection::vec(any::<u8>(), 0..400))
        .prop_filter("length must be wrong", |(w, h, bytes)| {
            bytes.len() != (w * h * 4) as usize
        })
        .prop_map(|(w, h, bytes)| PixelBuffer::from_raw_parts(w, h, bytes))
}

proptest! {
    #[test]
    fn grayscale_through_module_is_idempotent(buffer in arb_buffer()) {
        let invoker = native_invoker();
        let once = invoker.apply(Kernel::Grayscale, &buffer).unwrap();
        let twice = invoker.apply(Kernel::Grayscale, &once).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn output_keeps_shape_and_alpha(buffer in arb_buffer()) {
        let invoker = native_invoker();
        for kernel in Kernel::ALL {
            let out = invoker.apply(kernel, &buffer).unwrap();
            prop_assert_eq!(out.width(), buffer.width());
            prop_assert_eq!(out.height(), buffer.height());
            prop_assert_eq!(out.as_bytes().len(), buffer.as_bytes().len());
            for (src, dst) in buffer.pixels().iter().zip(out.pixels()) {
                prop_assert_eq!(src[3], dst[3]);
            }
        }
    }

    #[test]
    fn failed_apply_leaves_input_untouched(buffer in arb_malformed()) {
        let invoker = native_invoker();
        let before = buffer.clone();
        let result = invoker.apply(Kernel::Sepia, &buffer);
        prop_assert!(matches!(result, Err(TransformError::InvalidBuffer(_))));
        prop_assert_eq!(buffer, before);
    }
}

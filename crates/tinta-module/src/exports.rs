//! C exports for the `wasm32` build.
//!
//! Here the linear memory is the real wasm memory and pointers are plain
//! addresses in it. Each block carries its size in an 8-byte header so
//! `release` can rebuild the layout the host never sees.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr;

use tinta_core::{Kernel, expected_len};

const HEADER: usize = 8;

fn layout_for(size: usize) -> Option<Layout> {
    let total = size.checked_add(HEADER)?;
    Layout::from_size_align(total, HEADER).ok()
}

#[unsafe(no_mangle)]
pub extern "C" fn allocate(size: u32) -> *mut u8 {
    let size = size as usize;
    let Some(layout) = layout_for(size) else {
        return ptr::null_mut();
    };
    // SAFETY: layout has a non-zero size (at least the header).
    let base = unsafe { alloc(layout) };
    if base.is_null() {
        return base;
    }
    // SAFETY: `base` is aligned to 8 and valid for `HEADER + size` bytes.
    unsafe {
        base.cast::<usize>().write(size);
        base.add(HEADER)
    }
}

/// # Safety
/// `ptr` must be null or a pointer returned by [`allocate`] that has not been
/// released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn release(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: `ptr` came from `allocate`, so the header sits right before it.
    unsafe {
        let base = ptr.sub(HEADER);
        let size = base.cast::<usize>().read();
        if let Some(layout) = layout_for(size) {
            dealloc(base, layout);
        }
    }
}

/// # Safety
/// `ptr` must point to `width * height * 4` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn grayscale(ptr: *mut u8, width: u32, height: u32) {
    // SAFETY: forwarded caller contract.
    unsafe { run(Kernel::Grayscale, ptr, width, height) }
}

/// # Safety
/// `ptr` must point to `width * height * 4` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sepia(ptr: *mut u8, width: u32, height: u32) {
    // SAFETY: forwarded caller contract.
    unsafe { run(Kernel::Sepia, ptr, width, height) }
}

unsafe fn run(kernel: Kernel, ptr: *mut u8, width: u32, height: u32) {
    let Some(len) = expected_len(width, height) else {
        return;
    };
    if ptr.is_null() || len == 0 {
        return;
    }
    // SAFETY: caller guarantees `len` writable bytes at `ptr`.
    let bytes = unsafe { std::slice::from_raw_parts_mut(ptr, len) };
    kernel.run(bytes, width, height);
}

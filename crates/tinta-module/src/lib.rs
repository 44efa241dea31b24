//! Tinta compute module.
//!
//! The module only ever sees a flat byte region: the host allocates space,
//! copies RGBA8 pixels in, calls a kernel by pointer and dimensions, and
//! copies the result back out. [`ModuleAbi`] is that four-function contract;
//! [`NativeModule`] runs it in-process over a [`LinearMemory`]. Built for
//! `wasm32`, the same crate also exports the ABI as C symbols.

mod abi;
mod config;
mod memory;
mod native;

#[cfg(target_arch = "wasm32")]
#[allow(unsafe_code)]
// Exports hand raw pointers across the wasm boundary.
mod exports;

pub use abi::ModuleAbi;
pub use config::ModuleConfig;
pub use memory::{ALIGN, LinearMemory, NULL, PAGE_SIZE};
pub use native::NativeModule;

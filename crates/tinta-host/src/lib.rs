//! Tinta Host — the host side of the compute-module boundary.
//!
//! Moves [`PixelBuffer`](tinta_core::PixelBuffer)s into the module's linear
//! memory and back. [`TransformInvoker`] sequences one call at a time against
//! a module that becomes available through a one-shot [`readiness`] gate, and
//! [`ScopedAllocation`] guarantees every arena block is released on every
//! exit path.

pub mod arena;
pub mod config;
pub mod error;
pub mod invoker;
pub mod module_arena;
pub mod readiness;

// Re-exports for convenience.
pub use arena::{ArenaAllocation, KernelDispatch, MemoryArena, ScopedAllocation};
pub use config::{ContentionPolicy, InvokerConfig};
pub use error::{ArenaError, TransformError};
pub use invoker::TransformInvoker;
pub use module_arena::ModuleArena;
pub use readiness::{LoadState, ModuleHandle, ModuleLoader};

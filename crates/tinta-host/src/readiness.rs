//! One-shot readiness gate for a compute module that loads asynchronously.
//!
//! [`channel`] splits the gate into a [`ModuleLoader`], held by whatever
//! instantiates the module, and cloneable [`ModuleHandle`]s held by invokers.
//! Completing the loader consumes it, so the module becomes available exactly
//! once. Waiters block on a condition variable; nothing polls.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Where the module load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    /// The loader gave up; the module will never become available.
    Failed(String),
}

struct Shared<A> {
    state: Mutex<LoadState>,
    changed: Condvar,
    module: OnceLock<Mutex<A>>,
}

impl<A> Shared<A> {
    fn settle(&self, state: LoadState) {
        let mut current = self.state.lock();
        if *current == LoadState::Pending {
            *current = state;
            self.changed.notify_all();
        }
    }
}

/// Create a pending gate.
pub fn channel<A>() -> (ModuleLoader<A>, ModuleHandle<A>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(LoadState::Pending),
        changed: Condvar::new(),
        module: OnceLock::new(),
    });
    (
        ModuleLoader {
            shared: Some(Arc::clone(&shared)),
        },
        ModuleHandle { shared },
    )
}

/// The completing side of the gate. Dropping it unused fails the load.
pub struct ModuleLoader<A> {
    shared: Option<Arc<Shared<A>>>,
}

impl<A> ModuleLoader<A> {
    /// Publish the loaded module and wake every waiter.
    pub fn complete(mut self, module: A) {
        if let Some(shared) = self.shared.take() {
            // The loader is consumed here, so the cell is still empty.
            let _ = shared.module.set(Mutex::new(module));
            shared.settle(LoadState::Ready);
            tracing::info!("compute module ready");
        }
    }

    /// Record that the module could not be loaded.
    pub fn fail(mut self, reason: impl Into<String>) {
        if let Some(shared) = self.shared.take() {
            let reason = reason.into();
            tracing::error!("compute module failed to load: {reason}");
            shared.settle(LoadState::Failed(reason));
        }
    }
}

impl<A> Drop for ModuleLoader<A> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            tracing::warn!("compute module loader dropped before completing");
            shared.settle(LoadState::Failed("loader dropped".to_string()));
        }
    }
}

/// The observing side of the gate.
pub struct ModuleHandle<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for ModuleHandle<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A> ModuleHandle<A> {
    /// A handle to a module that is already loaded.
    pub fn ready(module: A) -> Self {
        let (loader, handle) = channel();
        loader.complete(module);
        handle
    }

    pub fn state(&self) -> LoadState {
        self.shared.state.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.module.get().is_some()
    }

    /// Block until the load settles. Returns whether the module is ready.
    pub fn wait(&self) -> bool {
        let mut state = self.shared.state.lock();
        while *state == LoadState::Pending {
            self.shared.changed.wait(&mut state);
        }
        *state == LoadState::Ready
    }

    /// Block until the load settles or `timeout` elapses. Returns whether the
    /// module is ready.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while *state == LoadState::Pending {
            if self
                .shared
                .changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        *state == LoadState::Ready
    }

    /// The module, if loaded.
    pub(crate) fn module(&self) -> Option<&Mutex<A>> {
        self.shared.module.get()
    }

    /// Lock the module for inspection, blocking behind any call in flight.
    pub fn lock(&self) -> Option<MutexGuard<'_, A>> {
        self.module().map(|module| module.lock())
    }
}

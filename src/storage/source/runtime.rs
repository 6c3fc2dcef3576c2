//! Blocking bridge onto the async database drivers.
//!
//! The hook API is synchronous. Each network source owns a small
//! multi-threaded runtime: connection tasks spawned by the drivers live on
//! it, and callers block on it for the duration of one statement.

use std::future::Future;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

/// Worker threads per source runtime. Statements are short; the workers
/// mostly drive connection I/O.
const WORKER_THREADS: usize = 2;

/// Runtime owned by a network connection source.
pub struct DriverRuntime {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl DriverRuntime {
    /// Builds a runtime whose threads are named after `backend`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the runtime cannot be started.
    pub fn new(backend: &str) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name(format!("sqlkv-{backend}"))
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    /// Handle connections use to block on driver futures.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Blocks the calling thread until `future` completes on this runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        block_on(&self.handle, future)
    }
}

impl Drop for DriverRuntime {
    // Dropping a runtime from async context panics; background shutdown
    // does not block.
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Blocks on `future` using `handle`.
///
/// From plain threads this is `Handle::block_on`. From inside a
/// multi-threaded tokio runtime the current worker is handed off first with
/// `block_in_place`. Calling from a current-thread runtime is not supported.
pub fn block_on<F: Future>(handle: &Handle, future: F) -> F::Output {
    match Handle::try_current() {
        Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        },
        _ => handle.block_on(future),
    }
}

//! Task scheduling for the frontal tree and the dense kernels.
//!
//! A `Scheduler` is an explicit object built from the thread cap in
//! `Control`. It owns its own worker pool (never rayon's global one) and is
//! passed into every factorization and solve call; it can be reused across
//! calls and is torn down when dropped. All parallel work (sibling subtrees,
//! column-parallel extend-add, split dense kernels) runs inside
//! `Scheduler::install` and uses the `join` / `map_ordered` helpers below,
//! which fall back to sequential execution without the `rayon` feature.

use crate::config::Control;
use crate::error::LuError;

pub mod kernels;
pub use kernels::{KernelCounts, KernelPolicy};

#[cfg(feature = "rayon")]
pub mod rayon_pool;
#[cfg(feature = "rayon")]
pub use rayon_pool::hardware_threads;

#[cfg(not(feature = "rayon"))]
pub fn hardware_threads() -> usize {
    1
}

enum Backend {
    #[cfg(feature = "rayon")]
    Rayon(rayon::ThreadPool),
    #[cfg(not(feature = "rayon"))]
    Serial,
}

/// Worker pool with a fixed thread cap.
pub struct Scheduler {
    threads: usize,
    backend: Backend,
}

impl Scheduler {
    /// Create a scheduler with at most `max_threads` workers (0 = hardware parallelism).
    pub fn new(max_threads: usize) -> Result<Self, LuError> {
        let threads = if max_threads == 0 {
            hardware_threads()
        } else {
            max_threads
        };
        #[cfg(feature = "rayon")]
        let backend = Backend::Rayon(rayon_pool::build_pool(threads)?);
        #[cfg(not(feature = "rayon"))]
        let (backend, threads) = {
            let _ = threads;
            (Backend::Serial, 1)
        };
        log::debug!("scheduler started with {threads} worker(s)");
        Ok(Self { threads, backend })
    }

    pub fn from_control(control: &Control) -> Result<Self, LuError> {
        Self::new(control.max_threads)
    }

    /// Number of worker threads available to this scheduler.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `op` on this scheduler's workers and wait for it.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.backend {
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.install(op),
            #[cfg(not(feature = "rayon"))]
            Backend::Serial => op(),
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("threads", &self.threads).finish()
    }
}

/// Run two closures, potentially in parallel on the current pool.
pub(crate) fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "rayon")]
    {
        rayon::join(a, b)
    }
    #[cfg(not(feature = "rayon"))]
    {
        (a(), b())
    }
}

/// Map `f` over `items`, potentially in parallel; results keep the input order.
pub(crate) fn map_ordered<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        items.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        items.iter().map(f).collect()
    }
}

/// Apply `f(j, column)` to every column of a column-major buffer with
/// `nrows` rows, potentially in parallel.
pub(crate) fn for_each_column<F>(data: &mut [f64], nrows: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Sync + Send,
{
    if nrows == 0 {
        return;
    }
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        data.par_chunks_mut(nrows)
            .enumerate()
            .for_each(|(j, col)| f(j, col));
    }
    #[cfg(not(feature = "rayon"))]
    {
        data.chunks_mut(nrows)
            .enumerate()
            .for_each(|(j, col)| f(j, col));
    }
}

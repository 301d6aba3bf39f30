// rayon-backed worker pool

use crate::error::LuError;

const WORKER_STACK: usize = 16 << 20;

/// Hardware parallelism, used when the caller leaves the thread cap at 0.
pub fn hardware_threads() -> usize {
    num_cpus::get().max(1)
}

/// Build a private pool; nothing here touches rayon's global pool.
pub(crate) fn build_pool(threads: usize) -> Result<rayon::ThreadPool, LuError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("parlu-worker-{i}"))
        // subtree recursion follows the depth of the frontal tree
        .stack_size(WORKER_STACK)
        .build()
        .map_err(|e| LuError::ThreadPool(e.to_string()))
}

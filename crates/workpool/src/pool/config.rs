use core::time::Duration;

pub const DEFAULT_INITIAL_WORKERS: usize = 5;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
pub const DEFAULT_PROCESS_DELAY: Duration = Duration::from_millis(500);

/// Tunables consumed by [`WorkerPool`](crate::WorkerPool).
///
/// The pool does not parse these itself; the server binary builds one from
/// CLI arguments and environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Workers spawned by [`WorkerPool::start`](crate::WorkerPool::start).
    pub initial_workers: usize,
    /// Maximum number of buffered messages.
    pub queue_capacity: usize,
    /// Artificial delay standing in for real per-message work.
    pub process_delay: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_workers: DEFAULT_INITIAL_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            process_delay: DEFAULT_PROCESS_DELAY,
        }
    }
}

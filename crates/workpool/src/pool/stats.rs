use serde::Serialize;

/// Point-in-time view of the pool's counters.
///
/// Every field is read independently, so a snapshot taken while workers are
/// busy is not linearizable; it is only ever used for reporting.
///
/// Worker counts are reported twice on purpose: `active_workers` is the
/// number of currently registered workers, `workers_created` is the lifetime
/// id counter. Removing a worker lowers the former but never the latter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Workers currently registered (not yet cancelled).
    pub active_workers: usize,
    /// Workers ever created; also the next id to be handed out.
    pub workers_created: u64,
    /// Worker tasks that have not exited yet, including cancelled ones still
    /// finishing a message.
    pub running_tasks: usize,
    /// Messages buffered in the queue right now.
    pub queue_length: usize,
    pub queue_capacity: usize,
    /// Messages taken off the queue by a worker.
    pub messages_processed: u64,
    /// Messages accepted by the queue.
    pub messages_total: u64,
    /// Messages turned away because the queue was full or closed.
    pub messages_rejected: u64,
}

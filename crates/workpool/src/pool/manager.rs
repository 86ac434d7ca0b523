//! Resizable pool of asynchronous workers draining a shared [`MessageQueue`].
//!
//! [`WorkerPool`] owns the queue, a registry of live workers and the
//! aggregate counters. Every worker is a Tokio task with its own
//! [`CancellationToken`], a child of the pool's root token. The pool keeps
//! the only handles that can fire them.
//!
//! Registry mutations (`add_worker`, `remove_worker`, `stop_all`) are
//! serialized by a write lock and never await while holding it. Counters
//! that only ever move forward are plain atomics.

use crate::{
    Message, MessageQueue, PoolConfig, PoolStats, SubmitError,
    pool::worker::{WorkerId, worker_loop},
};
use core::time::Duration;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span};

/// How [`WorkerPool::shutdown`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker exited within the deadline.
    Graceful,
    /// The deadline passed; the input queue was force-closed before waiting
    /// for the remaining workers.
    Forced,
}

/// A dynamically sized set of workers consuming one bounded queue.
///
/// All control operations are synchronous and cheap. Spawning requires a
/// Tokio runtime: [`add_worker`](Self::add_worker) panics when called
/// outside one, exactly like [`tokio::spawn`].
///
/// Logging goes through the [`Span`] handed to
/// [`with_span`](Self::with_span); each worker runs in a child `worker`
/// span carrying its id.
pub struct WorkerPool {
    queue: Arc<MessageQueue>,
    registry: RwLock<BTreeMap<WorkerId, CancellationToken>>,
    root: CancellationToken,
    next_id: AtomicU64,
    processed: Arc<AtomicU64>,
    tracker: TaskTracker,
    process_delay: Duration,
    span: Span,
}

impl WorkerPool {
    /// Creates an idle pool (no workers) with its own `pool` span.
    pub fn new(config: &PoolConfig) -> Self {
        let span = tracing::info_span!("pool", capacity = config.queue_capacity);
        Self::with_span(config, span)
    }

    /// Creates an idle pool that logs under `span`.
    pub fn with_span(config: &PoolConfig, span: Span) -> Self {
        let tracker = TaskTracker::new();
        // A closed tracker still accepts tasks; `wait` then resolves whenever
        // the task count reaches zero, which is the only semantics we need.
        tracker.close();

        Self {
            queue: Arc::new(MessageQueue::new(config.queue_capacity)),
            registry: RwLock::new(BTreeMap::new()),
            root: CancellationToken::new(),
            next_id: AtomicU64::new(0),
            processed: Arc::new(AtomicU64::new(0)),
            tracker,
            process_delay: config.process_delay,
            span,
        }
    }

    /// Creates a pool and spawns `config.initial_workers` workers.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(config: &PoolConfig) -> Self {
        let pool = Self::new(config);
        pool.add_workers(config.initial_workers);
        pool
    }

    /// Registers and spawns one worker, returning its id.
    ///
    /// Returns `None` once [`shutdown`](Self::shutdown) has started; no id is
    /// consumed in that case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn add_worker(&self) -> Option<WorkerId> {
        let id = {
            let mut registry = self.registry.write();
            if self.root.is_cancelled() {
                drop(registry);
                tracing::warn!(parent: &self.span, "pool is shutting down, not adding worker");
                return None;
            }

            let token = self.root.child_token();
            let id = WorkerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
            registry.insert(id, token.clone());

            let span = tracing::info_span!(parent: &self.span, "worker", id = %id);
            self.tracker.spawn(
                worker_loop(
                    Arc::clone(&self.queue),
                    token,
                    Arc::clone(&self.processed),
                    self.process_delay,
                )
                .instrument(span),
            );
            id
        };

        tracing::info!(parent: &self.span, worker_id = %id, "added worker");
        Some(id)
    }

    /// Adds up to `count` workers and returns the ids actually spawned; fewer
    /// than `count` only when the pool is shutting down.
    pub fn add_workers(&self, count: usize) -> Vec<WorkerId> {
        (0..count).map_while(|_| self.add_worker()).collect()
    }

    /// Cancels and deregisters the most recently added live worker.
    ///
    /// Returns `None`, leaving the pool untouched, if no worker is
    /// registered. The cancelled task may still be finishing its current
    /// message when this returns; [`wait`](Self::wait) observes its exit.
    pub fn remove_worker(&self) -> Option<WorkerId> {
        let removed = {
            let mut registry = self.registry.write();
            registry.pop_last().map(|(id, token)| {
                token.cancel();
                id
            })
        };

        match removed {
            Some(id) => tracing::info!(parent: &self.span, worker_id = %id, "removed worker"),
            None => tracing::warn!(parent: &self.span, "no workers to remove"),
        }
        removed
    }

    /// Removes up to `count` workers, stopping early once none are left.
    ///
    /// Returns how many were actually removed.
    pub fn remove_workers(&self, count: usize) -> usize {
        let mut removed = 0;
        while removed < count && self.remove_worker().is_some() {
            removed += 1;
        }
        removed
    }

    /// Cancels every registered worker and clears the registry in a single
    /// critical section. Returns the number of workers stopped.
    ///
    /// Unlike [`shutdown`](Self::shutdown), the pool stays usable: workers
    /// can be added again afterwards.
    pub fn stop_all(&self) -> usize {
        let stopped = {
            let mut registry = self.registry.write();
            for token in registry.values() {
                token.cancel();
            }
            core::mem::take(&mut *registry)
        };

        for id in stopped.keys() {
            tracing::info!(parent: &self.span, worker_id = %id, "stopped worker via stop_all");
        }
        stopped.len()
    }

    /// Offers `message` to the queue without blocking.
    ///
    /// Returns `false` if the queue is full or closed; the message is
    /// dropped.
    pub fn send(&self, message: impl Into<Message>) -> bool {
        match self.queue.try_submit(message.into()) {
            Ok(()) => {
                tracing::debug!(parent: &self.span, "queued message");
                true
            }
            Err(SubmitError::Full(msg)) => {
                tracing::warn!(parent: &self.span, %msg, "input queue full, dropping message");
                false
            }
            Err(SubmitError::Closed(msg)) => {
                tracing::warn!(parent: &self.span, %msg, "input queue closed, dropping message");
                false
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        let active_workers = self.registry.read().len();
        PoolStats {
            active_workers,
            workers_created: self.next_id.load(Ordering::Relaxed),
            running_tasks: self.tracker.len(),
            queue_length: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            messages_processed: self.processed.load(Ordering::Relaxed),
            messages_total: self.queue.accepted(),
            messages_rejected: self.queue.rejected(),
        }
    }

    /// Resolves once every worker task spawned so far has exited.
    ///
    /// Only meaningful after the workers were told to stop (via
    /// [`stop_all`](Self::stop_all) or [`close_input`](Self::close_input));
    /// otherwise it waits indefinitely.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    /// Closes the input queue so idle workers observe exhaustion and exit.
    ///
    /// Idempotent. Used as a shutdown escalation.
    pub fn close_input(&self) {
        if self.queue.close() {
            tracing::info!(parent: &self.span, "input queue closed");
        }
    }

    /// Two-phase shutdown: stop every worker, then wait up to `deadline` for
    /// the tasks to exit.
    ///
    /// The pool's root token is cancelled first, so any worker added
    /// concurrently is born cancelled and later calls to
    /// [`add_worker`](Self::add_worker) are refused.
    ///
    /// If the deadline passes, the input queue is force-closed and the pool
    /// waits again (unbounded) for the stragglers. Either way no worker task
    /// is left running when this returns.
    pub async fn shutdown(&self, deadline: Duration) -> ShutdownOutcome {
        self.root.cancel();
        let stopped = self.stop_all();
        tracing::info!(
            parent: &self.span,
            stopped,
            running = self.running_tasks(),
            "waiting for workers to exit"
        );

        if timeout(deadline, self.wait()).await.is_ok() {
            tracing::info!(parent: &self.span, "worker pool shutdown complete");
            return ShutdownOutcome::Graceful;
        }

        tracing::warn!(
            parent: &self.span,
            running = self.running_tasks(),
            "graceful shutdown timed out, closing input queue"
        );
        self.close_input();
        self.wait().await;
        ShutdownOutcome::Forced
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Number of currently registered workers.
    pub fn active_workers(&self) -> usize {
        self.registry.read().len()
    }

    /// Ids of the currently registered workers, ascending.
    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.registry.read().keys().copied().collect()
    }

    /// Worker tasks that have not exited yet.
    pub fn running_tasks(&self) -> usize {
        self.tracker.len()
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("stats", &self.stats())
            .field("process_delay", &self.process_delay)
            .finish_non_exhaustive()
    }
}

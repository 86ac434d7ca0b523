use crate::MessageQueue;
use core::fmt;
use core::time::Duration;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Identifier of a worker, allocated from a monotonically increasing counter.
///
/// Ids start at zero and are never handed out twice for the lifetime of a
/// [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkerId(u64);

impl WorkerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a worker task returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The worker's cancellation token fired.
    Cancelled,
    /// The queue was closed and had nothing left to hand out.
    Drained,
}

/// Worker task body: pull messages off `queue` until cancelled or drained.
///
/// Each iteration races the worker's [`CancellationToken`] against
/// [`MessageQueue::recv`]. The race is `biased` toward cancellation, so a
/// worker whose token has fired never takes another message even if one is
/// already waiting. Cancellation is cooperative: it is not observed while a
/// message is being processed.
///
/// Expected to be spawned inside a span that carries the worker id.
pub(crate) async fn worker_loop(
    queue: Arc<MessageQueue>,
    token: CancellationToken,
    processed: Arc<AtomicU64>,
    process_delay: Duration,
) -> WorkerExit {
    tracing::trace!("worker started");

    let exit = loop {
        let message = tokio::select! {
            biased;
            () = token.cancelled() => break WorkerExit::Cancelled,
            message = queue.recv() => message,
        };

        let Some(message) = message else {
            break WorkerExit::Drained;
        };

        processed.fetch_add(1, Ordering::Relaxed);
        tracing::info!(msg = %message, "worker received message");
        simulate_work(process_delay).await;
    };

    match exit {
        WorkerExit::Cancelled => tracing::info!("worker stopped"),
        WorkerExit::Drained => tracing::info!("input queue closed, worker exiting"),
    }
    exit
}

async fn simulate_work(delay: Duration) {
    if delay.is_zero() {
        // Still give other tasks a turn so a zero-delay worker cannot
        // monopolise a current-thread runtime.
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

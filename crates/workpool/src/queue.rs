//! Bounded, multi-consumer message queue with non-blocking admission.
//!
//! Producers never wait: [`MessageQueue::try_submit`] either places the
//! message in the buffer or hands it back immediately. Consumers (the pool's
//! worker tasks) await [`MessageQueue::recv`], which resolves with the next
//! message or with `None` once the queue has been closed and drained.

use crate::SubmitError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// An opaque message payload. No identity beyond its content.
pub type Message = String;

struct State {
    buffer: VecDeque<Message>,
    closed: bool,
}

/// A fixed-capacity FIFO shared between submitters and worker tasks.
///
/// The buffer length never exceeds [`capacity`](Self::capacity). Critical
/// sections only touch the `VecDeque`, so the lock is never held across an
/// `.await`.
pub struct MessageQueue {
    state: Mutex<State>,
    available: Notify,
    capacity: usize,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl MessageQueue {
    /// Creates an empty queue holding at most `capacity` messages.
    ///
    /// A capacity of zero yields a queue that rejects everything; the server
    /// refuses that configuration up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity.min(4096)),
                closed: false,
            }),
            available: Notify::new(),
            capacity,
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Attempts to enqueue `message` without blocking.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Full`] if the queue holds `capacity` messages.
    /// - [`SubmitError::Closed`] if [`close`](Self::close) was called.
    pub fn try_submit(&self, message: Message) -> Result<(), SubmitError> {
        {
            let mut state = self.state.lock();
            if state.closed {
                drop(state);
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(SubmitError::Closed(message));
            }
            if state.buffer.len() >= self.capacity {
                drop(state);
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(SubmitError::Full(message));
            }
            state.buffer.push_back(message);
        }
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.available.notify_one();
        Ok(())
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once the queue is closed *and* empty. Buffered messages
    /// are still delivered after `close`.
    ///
    /// Cancel safe: a message is only removed from the buffer in the same
    /// poll that returns it, so dropping this future (e.g. when losing a
    /// `select!` race) never loses one.
    pub async fn recv(&self) -> Option<Message> {
        loop {
            // Register interest before inspecting the buffer so a submit or
            // close landing in between still wakes us.
            let mut notified = pin!(self.available.notified());
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(message) = state.buffer.pop_front() {
                    return Some(message);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Closes the queue. Idempotent.
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let newly_closed = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.closed, true)
        };
        if newly_closed {
            self.available.notify_waiters();
        }
        newly_closed
    }

    /// Number of buffered messages. Point-in-time, may be stale immediately.
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total messages ever accepted.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Total messages ever turned away, whether full or closed.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl core::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .field("accepted", &self.accepted())
            .field("rejected", &self.rejected())
            .finish()
    }
}

use crate::Message;

/// Why a message was refused by the [`MessageQueue`](crate::MessageQueue).
///
/// Neither case is fatal. The rejected message is handed back so the caller
/// can decide what to do with it; the HTTP layer simply drops it and counts
/// it as "not sent".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The queue is at capacity.
    #[error("queue is full")]
    Full(Message),

    /// The queue was closed and accepts no further messages.
    #[error("queue is closed")]
    Closed(Message),
}

impl SubmitError {
    /// Returns the rejected message.
    pub fn into_inner(self) -> Message {
        match self {
            Self::Full(msg) | Self::Closed(msg) => msg,
        }
    }

    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

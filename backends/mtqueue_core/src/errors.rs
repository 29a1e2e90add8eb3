use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("bounded queue capacity must be at least 1")]
    ZeroCapacity,
}

/// Returned by the enqueue family. The rejected item is always handed back.
#[derive(Error, Clone, Copy, PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue held `capacity` items at the time of the attempt.
    #[error("queue is full")]
    Full(T),

    /// The queue was closed; no further items are accepted.
    #[error("queue is closed")]
    Closed(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl<T> core::fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full(_) => write!(f, "Full(..)"),
            Self::Closed(_) => write!(f, "Closed(..)"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    #[error("queue is empty")]
    Empty,

    /// End-of-stream: the queue is closed and has been drained.
    #[error("queue is closed and drained")]
    Closed,
}

impl PopError {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    #[error("completion tracker needs at least one producer")]
    NoProducers,

    #[error("producer {id} is out of range, tracker only knows {total} producers")]
    UnknownProducer { id: usize, total: usize },

    #[error("producer {id} was already marked as finished")]
    AlreadyFinished { id: usize },
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

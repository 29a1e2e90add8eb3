use std::sync::Arc;

use mtqueue_core::{BoundedQueue, PushError};

use crate::transcript::Transcript;

/// Handed to each producer closure. Enqueues through the context are
/// counted for the run report.
pub struct ProducerContext<T> {
    id: usize,
    items_per_producer: usize,
    queue: Arc<BoundedQueue<T>>,
    transcript: Transcript,
    produced: usize,
}

impl<T> ProducerContext<T> {
    pub(crate) fn new(
        id: usize,
        items_per_producer: usize,
        queue: Arc<BoundedQueue<T>>,
        transcript: Transcript,
    ) -> Self {
        Self {
            id,
            items_per_producer,
            queue,
            transcript,
            produced: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn items_per_producer(&self) -> usize {
        self.items_per_producer
    }

    /// Blocking enqueue, see [`BoundedQueue::enqueue`].
    ///
    /// # Errors
    ///
    /// [`PushError::Closed`] once the queue has been closed.
    pub fn enqueue(&mut self, item: T) -> Result<(), PushError<T>> {
        self.queue.enqueue(item)?;
        self.produced += 1;
        Ok(())
    }

    /// Non-blocking enqueue, see [`BoundedQueue::try_enqueue`].
    ///
    /// # Errors
    ///
    /// [`PushError::Full`] or [`PushError::Closed`], item handed back.
    pub fn try_enqueue(&mut self, item: T) -> Result<(), PushError<T>> {
        self.queue.try_enqueue(item)?;
        self.produced += 1;
        Ok(())
    }

    #[must_use]
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn log<S: AsRef<str>>(&self, message: S) {
        self.transcript.line(message);
    }
}

/// Handed to each consumer closure alongside every item.
pub struct ConsumerContext {
    id: usize,
    transcript: Transcript,
}

impl ConsumerContext {
    pub(crate) fn new(id: usize, transcript: Transcript) -> Self {
        Self { id, transcript }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn log<S: AsRef<str>>(&self, message: S) {
        self.transcript.line(message);
    }
}

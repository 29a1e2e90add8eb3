//! Bounded FIFO shared between producer and consumer threads.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::errors::{PopError, PushError, QueueError, QueueResult};
use crate::poison;
use crate::tracker::CompletionNotifier;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// `BoundedQueue` is a fixed-capacity FIFO guarded by a single mutex and two
/// condition variables, one for the "not full" predicate and one for
/// "not empty".
///
/// Every mutation happens under the same mutex, so the order in which items
/// are dequeued is the exact order in which enqueues succeeded across all
/// producers, not only per producer.
///
/// Blocking operations never spin: they park on the condition variable of
/// their predicate and re-check it after every wakeup, which covers spurious
/// wakeups and several waiters racing for the same slot. Each successful
/// mutation wakes exactly one waiter of the opposite side; which one is left
/// to the platform.
///
/// Share it between threads with an [`std::sync::Arc`].
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ZeroCapacity`] when `capacity` is 0, since both
    /// blocking operations would then wait forever.
    pub fn new(capacity: usize) -> QueueResult<Self> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        Ok(Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    /// Appends `item`, blocking the calling thread while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] with the item once the queue has been
    /// closed, including when the close happens while this call is waiting.
    pub fn enqueue(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = poison::lock(&self.state, "enqueue");

        while state.items.len() >= self.capacity && !state.closed {
            state = poison::wait(&self.not_full, state, "enqueue");
        }

        if state.closed {
            return Err(PushError::Closed(item));
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, blocking the calling thread while the queue
    /// is empty.
    ///
    /// Items still queued when the queue is closed are handed out first.
    ///
    /// # Errors
    ///
    /// Returns [`PopError::Closed`] (end-of-stream) once the queue is closed
    /// and drained.
    pub fn dequeue(&self) -> Result<T, PopError> {
        let mut state = poison::lock(&self.state, "dequeue");

        while state.items.is_empty() && !state.closed {
            state = poison::wait(&self.not_empty, state, "dequeue");
        }

        match state.items.pop_front() {
            Some(item) => {
                drop(state);
                self.not_full.notify_one();
                Ok(item)
            }
            None => Err(PopError::Closed),
        }
    }

    /// Appends `item` only if there is room right now. Never suspends.
    ///
    /// `Err(PushError::Full(_))` is the plain "rejected" outcome; callers that
    /// only need accepted/rejected can use `try_enqueue(item).is_ok()`.
    ///
    /// # Errors
    ///
    /// [`PushError::Full`] when the queue is at capacity and
    /// [`PushError::Closed`] when it has been closed. In both cases the queue
    /// is left untouched and the item is returned.
    pub fn try_enqueue(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = poison::lock(&self.state, "try_enqueue");

        if state.closed {
            return Err(PushError::Closed(item));
        }
        if state.items.len() >= self.capacity {
            return Err(PushError::Full(item));
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item if there is one right now. Never suspends.
    ///
    /// # Errors
    ///
    /// [`PopError::Empty`] while the queue is open and empty,
    /// [`PopError::Closed`] once it is closed and empty.
    pub fn try_pop(&self) -> Result<T, PopError> {
        let mut state = poison::lock(&self.state, "try_pop");

        match state.items.pop_front() {
            Some(item) => {
                drop(state);
                self.not_full.notify_one();
                Ok(item)
            }
            None if state.closed => Err(PopError::Closed),
            None => Err(PopError::Empty),
        }
    }

    /// Non-blocking dequeue; `None` means the queue was empty at the time of
    /// the call.
    pub fn try_dequeue(&self) -> Option<T> {
        self.try_pop().ok()
    }

    /// Closes the queue and wakes every blocked caller on both sides.
    ///
    /// Blocked and future enqueues fail with [`PushError::Closed`]; blocked
    /// and future dequeues drain what is left and then receive
    /// [`PopError::Closed`]. Returns `true` only for the call that actually
    /// closed the queue.
    pub fn close(&self) -> bool {
        let mut state = poison::lock(&self.state, "close");
        if state.closed {
            return false;
        }
        state.closed = true;
        let remaining = state.items.len();
        drop(state);

        mtqueue_logs::debug!(remaining = remaining, "bounded queue closed");

        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    /// Returns a blocking iterator that yields items until end-of-stream.
    #[must_use]
    pub fn iter(&self) -> Drain<'_, T> {
        Drain { queue: self }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the current length; may be stale as soon as it returns.
    #[must_use]
    pub fn len(&self) -> usize {
        poison::lock(&self.state, "len").items.len()
    }

    /// Snapshot; another thread may enqueue right after this returns `true`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        poison::lock(&self.state, "is_empty").items.is_empty()
    }

    /// Snapshot; another thread may dequeue right after this returns `true`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        poison::lock(&self.state, "is_full").items.len() >= self.capacity
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        poison::lock(&self.state, "is_closed").closed
    }
}

impl<T> core::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = poison::lock(&self.state, "debug");
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T: Send> CompletionNotifier for BoundedQueue<T> {
    fn on_complete(&self) {
        self.close();
    }
}

/// Blocking iterator returned by [`BoundedQueue::iter`].
pub struct Drain<'a, T> {
    queue: &'a BoundedQueue<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.dequeue().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn zero_capacity_is_rejected() {
        let result = BoundedQueue::<u32>::new(0);
        assert!(matches!(result, Err(QueueError::ZeroCapacity)));
    }

    #[test]
    fn items_come_out_in_insertion_order() {
        let queue = BoundedQueue::new(4).expect("should create queue");

        for value in [3, 1, 4, 1] {
            queue.enqueue(value).expect("should enqueue");
        }

        let drained: Vec<_> = (0..4).map(|_| queue.dequeue().expect("should dequeue")).collect();
        assert_eq!(drained, vec![3, 1, 4, 1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn try_enqueue_hands_back_item_when_full() {
        let queue = BoundedQueue::new(1).expect("should create queue");
        queue.try_enqueue(String::from("first")).expect("room for one");

        let started = Instant::now();
        let err = queue
            .try_enqueue(String::from("second"))
            .expect_err("queue is full");

        assert!(started.elapsed() < Duration::from_millis(10));
        assert!(err.is_full());
        assert_eq!(err.into_inner(), "second");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn try_enqueue_reads_as_accepted_or_rejected() {
        let queue = BoundedQueue::new(2).expect("should create queue");

        assert!(queue.try_enqueue(1_u8).is_ok());
        assert!(queue.try_enqueue(2).is_ok());
        assert!(queue.try_enqueue(3).is_err());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn try_dequeue_on_empty_returns_none() {
        let queue = BoundedQueue::<u8>::new(2).expect("should create queue");

        let started = Instant::now();
        assert_eq!(queue.try_dequeue(), None);
        assert!(started.elapsed() < Duration::from_millis(10));
        assert_eq!(queue.try_pop(), Err(PopError::Empty));
    }

    #[test]
    fn snapshots_are_stable_without_mutation() {
        let queue = BoundedQueue::new(2).expect("should create queue");
        queue.enqueue(1).expect("should enqueue");

        for _ in 0..10 {
            assert!(!queue.is_empty());
            assert!(!queue.is_full());
        }

        queue.enqueue(2).expect("should enqueue");
        for _ in 0..10 {
            assert!(queue.is_full());
        }
    }

    #[test]
    fn close_drains_remaining_items_before_end_of_stream() {
        let queue = BoundedQueue::new(3).expect("should create queue");
        queue.enqueue('a').expect("should enqueue");
        queue.enqueue('b').expect("should enqueue");

        assert!(queue.close());
        assert!(!queue.close(), "second close is a no-op");

        assert!(matches!(queue.enqueue('c'), Err(PushError::Closed('c'))));
        assert!(matches!(queue.try_enqueue('d'), Err(PushError::Closed('d'))));

        assert_eq!(queue.dequeue(), Ok('a'));
        assert_eq!(queue.try_pop(), Ok('b'));
        assert_eq!(queue.dequeue(), Err(PopError::Closed));
        assert_eq!(queue.try_pop(), Err(PopError::Closed));
    }

    #[test]
    fn iter_stops_at_end_of_stream() {
        let queue = BoundedQueue::new(5).expect("should create queue");
        for value in 0..5 {
            queue.enqueue(value).expect("should enqueue");
        }
        queue.close();

        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn close_wakes_blocked_dequeuer() {
        let queue = Arc::new(BoundedQueue::<u64>::new(1).expect("should create queue"));
        let (started_tx, started_rx) = mpsc::channel();

        let waiter_queue = Arc::clone(&queue);
        let waiter = thread::spawn(move || {
            started_tx.send(()).expect("should signal");
            waiter_queue.dequeue()
        });

        started_rx.recv().expect("waiter should start");
        thread::sleep(Duration::from_millis(50));
        queue.close();

        let result = waiter.join().expect("waiter should not panic");
        assert_eq!(result, Err(PopError::Closed));
    }

    #[test]
    fn close_wakes_blocked_enqueuer() {
        let queue = Arc::new(BoundedQueue::new(1).expect("should create queue"));
        queue.enqueue(1_u64).expect("should enqueue");

        let waiter_queue = Arc::clone(&queue);
        let waiter = thread::spawn(move || waiter_queue.enqueue(2));

        thread::sleep(Duration::from_millis(50));
        queue.close();

        let result = waiter.join().expect("waiter should not panic");
        assert!(matches!(result, Err(PushError::Closed(2))));
        assert_eq!(queue.dequeue(), Ok(1));
    }

    #[test]
    fn debug_reports_capacity_and_length() {
        let queue = BoundedQueue::new(2).expect("should create queue");
        queue.enqueue(7).expect("should enqueue");

        let rendered = format!("{queue:?}");
        assert!(rendered.contains("capacity: 2"));
        assert!(rendered.contains("len: 1"));
        assert!(rendered.contains("closed: false"));
    }
}

//! Consumer-side termination detection without a sentinel item.
//!
//! A polling consumer alternates between draining the queue and checking
//! whether every producer has reported done. Both facts live in different
//! places (tracker counter and queue buffer) and no single condition variable
//! covers them, so the check is a cooperative busy-wait with backoff.

use crossbeam::utils::Backoff;

use crate::errors::PopError;
use crate::queue::BoundedQueue;
use crate::tracker::CompletionTracker;

/// The CheckDone predicate: all producers done and nothing left to take.
///
/// The tracker is read first. Its acquire load pairs with each producer's
/// release increment, so any item a producer enqueued before reporting is
/// already in the buffer by the time emptiness is sampled. Reading in the
/// opposite order could see an empty queue, then a producer enqueues its
/// last item and reports, then the tracker reads as done.
#[must_use]
pub fn should_terminate<T>(tracker: &CompletionTracker, queue: &BoundedQueue<T>) -> bool {
    tracker.all_producers_done() && queue.is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Polling,
    CheckDone,
    Terminated,
}

/// Result of a single [`PollingConsumer::step`].
#[derive(Debug, PartialEq, Eq)]
pub enum Step<T> {
    Item(T),
    Idle,
    Terminated,
}

pub struct PollingConsumer<'a, T> {
    queue: &'a BoundedQueue<T>,
    tracker: &'a CompletionTracker,
    state: ConsumerState,
    backoff: Backoff,
    checks: usize,
}

impl<'a, T> PollingConsumer<'a, T> {
    #[must_use]
    pub fn new(queue: &'a BoundedQueue<T>, tracker: &'a CompletionTracker) -> Self {
        Self {
            queue,
            tracker,
            state: ConsumerState::Polling,
            backoff: Backoff::new(),
            checks: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Number of times the consumer went through CheckDone.
    #[must_use]
    pub fn checks(&self) -> usize {
        self.checks
    }

    /// Advances the state machine by one transition.
    pub fn step(&mut self) -> Step<T> {
        match self.state {
            ConsumerState::Terminated => Step::Terminated,
            ConsumerState::Polling => match self.queue.try_pop() {
                Ok(item) => {
                    self.backoff.reset();
                    Step::Item(item)
                }
                // someone closed the queue and it is drained: nothing can arrive
                Err(PopError::Closed) => {
                    self.state = ConsumerState::Terminated;
                    Step::Terminated
                }
                Err(PopError::Empty) => {
                    self.state = ConsumerState::CheckDone;
                    Step::Idle
                }
            },
            ConsumerState::CheckDone => {
                self.checks += 1;
                if should_terminate(self.tracker, self.queue) {
                    self.state = ConsumerState::Terminated;
                    return Step::Terminated;
                }

                self.backoff.snooze();
                self.state = ConsumerState::Polling;
                Step::Idle
            }
        }
    }

    /// Drives the consumer until it terminates, handing every item to
    /// `handle`. Returns how many items were consumed.
    pub fn run<F>(mut self, mut handle: F) -> usize
    where
        F: FnMut(T),
    {
        let mut consumed = 0;
        loop {
            match self.step() {
                Step::Item(item) => {
                    handle(item);
                    consumed += 1;
                }
                Step::Idle => {}
                Step::Terminated => return consumed,
            }
        }
    }
}

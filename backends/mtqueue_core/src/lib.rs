//! Bounded multi-producer/multi-consumer queue and the cooperative shutdown
//! protocol built around it.
//!
//! - [`BoundedQueue`]: fixed-capacity FIFO with blocking (`enqueue`,
//!   `dequeue`) and non-blocking (`try_enqueue`, `try_dequeue`) operations and
//!   an explicit [`BoundedQueue::close`].
//! - [`CompletionTracker`]: shared count of producers that have finished.
//! - [`PollingConsumer`]: the consumer loop that stops once every producer is
//!   done and the queue is drained.
//!
//! ```rust
//! use mtqueue_core::{BoundedQueue, CompletionTracker, PollingConsumer};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(BoundedQueue::new(4).unwrap());
//! let tracker = Arc::new(CompletionTracker::new(1).unwrap());
//!
//! let (q, t) = (Arc::clone(&queue), Arc::clone(&tracker));
//! let producer = thread::spawn(move || {
//!     for i in 0..10 {
//!         q.enqueue(i).unwrap();
//!     }
//!     t.mark_producer_done(0).unwrap();
//! });
//!
//! let consumed = PollingConsumer::new(&queue, &tracker).run(|_| {});
//! producer.join().unwrap();
//! assert_eq!(consumed, 10);
//! ```

mod errors;
mod poison;
mod queue;
mod termination;
mod tracker;

pub use errors::*;
pub use queue::*;
pub use termination::*;
pub use tracker::*;

//! Counts finished producers so consumers can tell when no more items will arrive.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::{TrackerError, TrackerResult};
use crate::poison;

/// `CompletionNotifier` is fired once when the last producer reports done.
///
/// [`crate::BoundedQueue`] implements it by closing itself, which turns the
/// consumers' busy-wait into a single wakeup.
pub trait CompletionNotifier: Send + Sync {
    fn on_complete(&self);
}

/// Outcome of [`CompletionTracker::mark_producer_done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Pending { remaining: usize },
    AllDone,
}

/// `CompletionTracker` holds `(finished, total)` for a fixed set of
/// producers identified by `0..total`.
///
/// The finished counter only grows, is bumped with release ordering and read
/// with acquire ordering: a consumer that observes `finished == total` also
/// observes every enqueue those producers made before reporting.
pub struct CompletionTracker {
    total: usize,
    finished: AtomicUsize,
    marked: Box<[AtomicBool]>,
    notifiers: Mutex<Vec<Arc<dyn CompletionNotifier>>>,
}

impl CompletionTracker {
    /// # Errors
    ///
    /// [`TrackerError::NoProducers`] when `total_producers` is 0.
    pub fn new(total_producers: usize) -> TrackerResult<Self> {
        if total_producers == 0 {
            return Err(TrackerError::NoProducers);
        }

        Ok(Self {
            total: total_producers,
            finished: AtomicUsize::new(0),
            marked: (0..total_producers).map(|_| AtomicBool::new(false)).collect(),
            notifiers: Mutex::new(Vec::new()),
        })
    }

    /// Records that `producer_id` has emitted its last item.
    ///
    /// Must be called after the producer's last successful enqueue, never
    /// before, otherwise consumers may stop while that item is in flight.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownProducer`] for an id outside `0..total` and
    /// [`TrackerError::AlreadyFinished`] when the same producer reports
    /// twice. Neither changes the count.
    pub fn mark_producer_done(&self, producer_id: usize) -> TrackerResult<Completion> {
        let slot = self
            .marked
            .get(producer_id)
            .ok_or(TrackerError::UnknownProducer {
                id: producer_id,
                total: self.total,
            })?;

        if slot.swap(true, Ordering::AcqRel) {
            mtqueue_logs::warn!(producer = producer_id, "producer reported done twice");
            return Err(TrackerError::AlreadyFinished { id: producer_id });
        }

        let finished = self.finished.fetch_add(1, Ordering::AcqRel) + 1;
        mtqueue_logs::debug!(
            producer = producer_id,
            finished = finished,
            total = self.total,
            "producer finished"
        );

        if finished < self.total {
            return Ok(Completion::Pending {
                remaining: self.total - finished,
            });
        }

        self.fire_notifiers();
        Ok(Completion::AllDone)
    }

    #[must_use]
    pub fn all_producers_done(&self) -> bool {
        self.finished.load(Ordering::Acquire) == self.total
    }

    #[must_use]
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Registers `notifier` to run once all producers are done. If that has
    /// already happened it runs immediately on the calling thread.
    pub fn subscribe(&self, notifier: Arc<dyn CompletionNotifier>) {
        let mut notifiers = poison::lock(&self.notifiers, "subscribe");
        if !self.all_producers_done() {
            notifiers.push(notifier);
            return;
        }
        drop(notifiers);

        notifier.on_complete();
    }

    fn fire_notifiers(&self) {
        // taken under the lock so a concurrent subscribe either lands in this
        // batch or sees the completed count and fires itself
        let notifiers = std::mem::take(&mut *poison::lock(&self.notifiers, "fire_notifiers"));

        mtqueue_logs::info!(
            total = self.total,
            notifiers = notifiers.len(),
            "all producers finished"
        );

        for notifier in notifiers {
            notifier.on_complete();
        }
    }
}

impl core::fmt::Debug for CompletionTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompletionTracker")
            .field("finished", &self.finished())
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct CountingNotifier(AtomicUsize);

    impl CompletionNotifier for CountingNotifier {
        fn on_complete(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn rejects_zero_producers() {
        assert!(matches!(
            CompletionTracker::new(0),
            Err(TrackerError::NoProducers)
        ));
    }

    #[test]
    fn reports_remaining_until_all_done() {
        let tracker = CompletionTracker::new(3).expect("should create tracker");

        assert_eq!(
            tracker.mark_producer_done(1),
            Ok(Completion::Pending { remaining: 2 })
        );
        assert!(!tracker.all_producers_done());
        assert_eq!(
            tracker.mark_producer_done(0),
            Ok(Completion::Pending { remaining: 1 })
        );
        assert_eq!(tracker.mark_producer_done(2), Ok(Completion::AllDone));
        assert!(tracker.all_producers_done());
        assert_eq!(tracker.finished(), 3);
    }

    #[test]
    #[traced_test]
    fn marking_twice_is_a_usage_error() {
        let tracker = CompletionTracker::new(2).expect("should create tracker");

        tracker.mark_producer_done(0).expect("first report");
        assert_eq!(
            tracker.mark_producer_done(0),
            Err(TrackerError::AlreadyFinished { id: 0 })
        );
        assert_eq!(tracker.finished(), 1);
        assert!(!tracker.all_producers_done());
        assert!(logs_contain("producer reported done twice"));
    }

    #[test]
    fn unknown_producer_is_rejected() {
        let tracker = CompletionTracker::new(2).expect("should create tracker");

        assert_eq!(
            tracker.mark_producer_done(2),
            Err(TrackerError::UnknownProducer { id: 2, total: 2 })
        );
        assert_eq!(tracker.finished(), 0);
    }

    #[test]
    fn notifiers_fire_once_on_completion() {
        let tracker = CompletionTracker::new(2).expect("should create tracker");
        let notifier = Arc::new(CountingNotifier::default());
        tracker.subscribe(notifier.clone());

        tracker.mark_producer_done(0).expect("report");
        assert_eq!(notifier.0.load(Ordering::SeqCst), 0);

        tracker.mark_producer_done(1).expect("report");
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);

        let _ = tracker.mark_producer_done(1);
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_subscriber_fires_immediately() {
        let tracker = CompletionTracker::new(1).expect("should create tracker");
        tracker.mark_producer_done(0).expect("report");

        let notifier = Arc::new(CountingNotifier::default());
        tracker.subscribe(notifier.clone());
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }
}

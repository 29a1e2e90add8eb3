//! Thread lifecycle for producers and consumers sharing one bounded queue.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use mtqueue_core::{BoundedQueue, CompletionTracker, PollingConsumer};

use crate::config::{HarnessConfig, TerminationStrategy};
use crate::context::{ConsumerContext, ProducerContext};
use crate::errors::{HarnessError, HarnessResult, WorkerRole};
use crate::guards::RunOnDrop;
use crate::report::HarnessReport;
use crate::transcript::Transcript;

/// `WorkerHarness` spawns `M` producer and `N` consumer threads over a
/// freshly built [`BoundedQueue`] and [`CompletionTracker`], joins every
/// producer, then every consumer, and only then lets go of the shared state.
///
/// Producers are marked done by the harness once their closure returns (or
/// unwinds), so the completion count is always bumped after a producer's
/// last enqueue.
///
/// # Examples
///
/// ```
/// use mtqueue_harness::{HarnessConfig, WorkerHarness};
///
/// let harness = WorkerHarness::new(HarnessConfig::new().producers(2).consumers(2));
/// let report = harness
///     .run(
///         |ctx| {
///             for i in 0..ctx.items_per_producer() {
///                 ctx.enqueue(ctx.id() * 100 + i).unwrap();
///             }
///         },
///         |_ctx, _item| {},
///     )
///     .unwrap();
///
/// assert_eq!(report.produced, 10);
/// assert!(report.is_balanced());
/// ```
pub struct WorkerHarness {
    config: HarnessConfig,
    transcript: Transcript,
}

impl WorkerHarness {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            transcript: Transcript::silent(),
        }
    }

    #[must_use]
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one producer/consumer session.
    ///
    /// `producer` is called once per producer thread with its context;
    /// `consumer` is called for every item a consumer thread receives.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::InvalidConfig`] when the configuration is invalid.
    /// - [`HarnessError::Spawn`] when the OS refuses a thread; workers that
    ///   were already running are shut down and joined first.
    /// - [`HarnessError::WorkerPanicked`] for the first worker that panicked,
    ///   reported after every other worker has been joined.
    pub fn run<T, P, C>(&self, producer: P, consumer: C) -> HarnessResult<HarnessReport>
    where
        T: Send + 'static,
        P: Fn(&mut ProducerContext<T>) + Send + Sync + 'static,
        C: Fn(&ConsumerContext, T) + Send + Sync + 'static,
    {
        self.config.validate()?;

        let producer_count = self.config.get_producers();
        let consumer_count = self.config.get_consumers();
        let strategy = self.config.get_strategy();

        let queue = Arc::new(BoundedQueue::new(self.config.get_capacity())?);
        let tracker = Arc::new(CompletionTracker::new(producer_count)?);
        if strategy == TerminationStrategy::Close {
            tracker.subscribe(queue.clone());
        }

        mtqueue_logs::info!(
            producers = producer_count,
            consumers = consumer_count,
            capacity = queue.capacity(),
            strategy = %strategy,
            "starting worker harness"
        );

        let started = Instant::now();
        let producer = Arc::new(producer);
        let consumer = Arc::new(consumer);

        let mut producers = Vec::with_capacity(producer_count);
        for id in 0..producer_count {
            match self.spawn_producer(id, &queue, &tracker, &producer) {
                Ok(handle) => producers.push(handle),
                Err(err) => {
                    release_unstarted(&tracker, id);
                    abandon(&queue, producers);
                    return Err(err);
                }
            }
        }

        let mut consumers = Vec::with_capacity(consumer_count);
        for id in 0..consumer_count {
            match self.spawn_consumer(id, strategy, &queue, &tracker, &consumer) {
                Ok(handle) => consumers.push(handle),
                Err(err) => {
                    abandon(&queue, producers);
                    abandon(&queue, consumers);
                    return Err(err);
                }
            }
        }

        let mut failure = None;

        let mut produced = 0;
        for (id, handle) in producers.into_iter().enumerate() {
            match handle.join() {
                Ok(count) => produced += count,
                Err(_) => {
                    failure.get_or_insert(HarnessError::WorkerPanicked {
                        role: WorkerRole::Producer,
                        id,
                    });
                }
            }
        }

        let mut consumed_per_consumer = Vec::with_capacity(consumer_count);
        for (id, handle) in consumers.into_iter().enumerate() {
            match handle.join() {
                Ok(count) => consumed_per_consumer.push(count),
                Err(_) => {
                    consumed_per_consumer.push(0);
                    failure.get_or_insert(HarnessError::WorkerPanicked {
                        role: WorkerRole::Consumer,
                        id,
                    });
                }
            }
        }

        if let Some(err) = failure {
            mtqueue_logs::error!("worker harness failed: {}", err);
            return Err(err);
        }

        let report = HarnessReport {
            produced,
            consumed_per_consumer,
            duration: started.elapsed(),
            producers: producer_count,
            consumers: consumer_count,
            strategy,
        };

        self.transcript.line("All producers and consumers finished.");
        mtqueue_logs::info!("worker harness finished: {}", report);

        Ok(report)
    }

    fn spawn_producer<T, P>(
        &self,
        id: usize,
        queue: &Arc<BoundedQueue<T>>,
        tracker: &Arc<CompletionTracker>,
        producer: &Arc<P>,
    ) -> HarnessResult<JoinHandle<usize>>
    where
        T: Send + 'static,
        P: Fn(&mut ProducerContext<T>) + Send + Sync + 'static,
    {
        let queue = Arc::clone(queue);
        let tracker = Arc::clone(tracker);
        let producer = Arc::clone(producer);
        let transcript = self.transcript.clone();
        let items_per_producer = self.config.get_items_per_producer();

        thread::Builder::new()
            .name(format!("producer-{id}"))
            .spawn(move || {
                // dropped after the closure below has returned or unwound
                let _done = RunOnDrop::new(|| report_done(&tracker, id));

                let mut context = ProducerContext::new(id, items_per_producer, queue, transcript);
                producer(&mut context);
                context.produced()
            })
            .map_err(|source| HarnessError::Spawn {
                role: WorkerRole::Producer,
                id,
                source,
            })
    }

    fn spawn_consumer<T, C>(
        &self,
        id: usize,
        strategy: TerminationStrategy,
        queue: &Arc<BoundedQueue<T>>,
        tracker: &Arc<CompletionTracker>,
        consumer: &Arc<C>,
    ) -> HarnessResult<JoinHandle<usize>>
    where
        T: Send + 'static,
        C: Fn(&ConsumerContext, T) + Send + Sync + 'static,
    {
        let queue = Arc::clone(queue);
        let tracker = Arc::clone(tracker);
        let consumer = Arc::clone(consumer);
        let context = ConsumerContext::new(id, self.transcript.clone());

        thread::Builder::new()
            .name(format!("consumer-{id}"))
            .spawn(move || {
                // a dead consumer may leave producers parked on a full queue
                let _release = RunOnDrop::new(|| {
                    if thread::panicking() {
                        mtqueue_logs::warn!(consumer = id, "consumer panicked, closing queue");
                        queue.close();
                    }
                });

                match strategy {
                    TerminationStrategy::Polling => PollingConsumer::new(&queue, &tracker)
                        .run(|item| consumer(&context, item)),
                    TerminationStrategy::Close => {
                        let mut consumed = 0;
                        for item in queue.iter() {
                            consumer(&context, item);
                            consumed += 1;
                        }
                        consumed
                    }
                }
            })
            .map_err(|source| HarnessError::Spawn {
                role: WorkerRole::Consumer,
                id,
                source,
            })
    }
}

fn report_done(tracker: &CompletionTracker, id: usize) {
    if thread::panicking() {
        mtqueue_logs::warn!(producer = id, "producer panicked, counting it as finished");
    }
    if let Err(err) = tracker.mark_producer_done(id) {
        mtqueue_logs::error!(producer = id, "failed to report producer completion: {}", err);
    }
}

/// Producers that never started still have to count as done.
fn release_unstarted(tracker: &CompletionTracker, first_missing: usize) {
    for missing in first_missing..tracker.total() {
        if let Err(err) = tracker.mark_producer_done(missing) {
            mtqueue_logs::error!(
                producer = missing,
                "failed to report unstarted producer: {}",
                err
            );
        }
    }
}

fn abandon<T, R>(queue: &BoundedQueue<T>, handles: Vec<JoinHandle<R>>) {
    queue.close();
    for handle in handles {
        let _ = handle.join();
    }
}

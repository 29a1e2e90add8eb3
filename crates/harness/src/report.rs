use core::time::Duration;

use crate::config::TerminationStrategy;

/// Result of a [`crate::WorkerHarness`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessReport {
    /// Items successfully enqueued, summed over all producers
    pub produced: usize,
    /// Items handed to each consumer, indexed by consumer id
    pub consumed_per_consumer: Vec<usize>,
    /// Wall-clock time from spawning the first worker to joining the last
    pub duration: Duration,
    pub producers: usize,
    pub consumers: usize,
    pub strategy: TerminationStrategy,
}

impl HarnessReport {
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed_per_consumer.iter().sum()
    }

    /// True when every produced item reached a consumer.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.produced == self.consumed()
    }

    /// Consumed items per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.consumed() as f64 / secs
        }
    }
}

impl core::fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} producers, {} consumers ({}): produced {}, consumed {} {:?} in {:?}",
            self.producers,
            self.consumers,
            self.strategy,
            self.produced,
            self.consumed(),
            self.consumed_per_consumer,
            self.duration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(produced: usize, consumed: Vec<usize>) -> HarnessReport {
        HarnessReport {
            produced,
            consumers: consumed.len(),
            consumed_per_consumer: consumed,
            duration: Duration::from_millis(500),
            producers: 3,
            strategy: TerminationStrategy::Polling,
        }
    }

    #[test]
    fn balanced_when_totals_match() {
        let balanced = report(15, vec![7, 8]);
        assert_eq!(balanced.consumed(), 15);
        assert!(balanced.is_balanced());
        assert!((balanced.throughput() - 30.0).abs() < f64::EPSILON);

        assert!(!report(15, vec![7, 7]).is_balanced());
    }

    #[test]
    fn display_mentions_strategy_and_totals() {
        let rendered = report(15, vec![7, 8]).to_string();
        assert!(rendered.contains("polling"));
        assert!(rendered.contains("produced 15"));
        assert!(rendered.contains("[7, 8]"));
    }
}

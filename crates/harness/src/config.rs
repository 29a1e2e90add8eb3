//! Harness configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, HarnessResult};

/// How consumers find out that no more items will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminationStrategy {
    /// Consumers poll with `try_dequeue` and, when the queue is momentarily
    /// empty, check the completion tracker before backing off.
    Polling,

    /// The queue is closed when the last producer reports done; consumers
    /// block in `dequeue` until end-of-stream.
    #[default]
    Close,
}

impl core::fmt::Display for TerminationStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Close => write!(f, "close"),
        }
    }
}

impl core::str::FromStr for TerminationStrategy {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "close" => Ok(Self::Close),
            _ => Err(HarnessError::InvalidConfig("strategy must be `polling` or `close`")),
        }
    }
}

/// Configuration for [`crate::WorkerHarness`].
///
/// Defaults:
/// - `producers`: 3
/// - `consumers`: 2
/// - `capacity`: 10
/// - `items_per_producer`: 5
/// - `strategy`: [`TerminationStrategy::Close`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    producers: usize,
    consumers: usize,
    capacity: usize,
    items_per_producer: usize,
    strategy: TerminationStrategy,
}

impl HarnessConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            producers: 3,
            consumers: 2,
            capacity: 10,
            items_per_producer: 5,
            strategy: TerminationStrategy::Close,
        }
    }

    /// Loads a configuration from a TOML file; missing keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Config`] when the file is missing or malformed.
    pub fn from_path<V: Into<PathBuf>>(target: V) -> HarnessResult<Self> {
        Ok(mtqueue_config::from_path(target)?)
    }

    #[must_use]
    pub const fn producers(mut self, count: usize) -> Self {
        self.producers = count;
        self
    }

    #[must_use]
    pub const fn consumers(mut self, count: usize) -> Self {
        self.consumers = count;
        self
    }

    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// How many items each producer is expected to emit. The harness hands
    /// this to producers through their context; it does not enforce it.
    #[must_use]
    pub const fn items_per_producer(mut self, count: usize) -> Self {
        self.items_per_producer = count;
        self
    }

    #[must_use]
    pub const fn strategy(mut self, strategy: TerminationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn get_producers(&self) -> usize {
        self.producers
    }

    #[must_use]
    pub const fn get_consumers(&self) -> usize {
        self.consumers
    }

    #[must_use]
    pub const fn get_capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn get_items_per_producer(&self) -> usize {
        self.items_per_producer
    }

    #[must_use]
    pub const fn get_strategy(&self) -> TerminationStrategy {
        self.strategy
    }

    /// # Errors
    ///
    /// [`HarnessError::InvalidConfig`] for zero producers, consumers or
    /// capacity.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.producers == 0 {
            return Err(HarnessError::InvalidConfig("at least one producer is required"));
        }
        if self.consumers == 0 {
            return Err(HarnessError::InvalidConfig("at least one consumer is required"));
        }
        if self.capacity == 0 {
            return Err(HarnessError::InvalidConfig("queue capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

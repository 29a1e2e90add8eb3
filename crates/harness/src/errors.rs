use mtqueue_config::ConfigError;
use mtqueue_core::{QueueError, TrackerError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    Producer,
    Consumer,
}

impl core::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Producer => write!(f, "producer"),
            Self::Consumer => write!(f, "consumer"),
        }
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("invalid harness configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("failed to spawn {role} thread {id}: {source}")]
    Spawn {
        role: WorkerRole,
        id: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} {id} panicked")]
    WorkerPanicked { role: WorkerRole, id: usize },
}

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

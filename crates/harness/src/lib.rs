//! Producer/consumer thread harness over an [`mtqueue_core::BoundedQueue`].
//!
//! The harness owns thread lifecycles only: it spawns producers and
//! consumers with shared handles to the queue and completion tracker, joins
//! them, and reports what happened. Business logic lives in the closures it
//! is given.

mod config;
mod context;
mod errors;
mod guards;
mod harness;
mod report;
mod transcript;

pub use config::{HarnessConfig, TerminationStrategy};
pub use context::{ConsumerContext, ProducerContext};
pub use errors::{HarnessError, HarnessResult, WorkerRole};
pub use harness::WorkerHarness;
pub use report::HarnessReport;
pub use transcript::Transcript;

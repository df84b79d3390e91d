//! Run resolution.
//!
//! [`RunResolver`] drives one conversation run to completion: it consumes
//! the run's event stream, resolves every tool call batch the service asks
//! for, submits the outputs and resumes on the fresh stream, until the run
//! reaches a terminal event.
//!
//! Runs share only the read-only [`ToolRegistry`](crate::tools::ToolRegistry),
//! so any number can be resolved concurrently on separate tasks.

mod error;
mod observer;
mod resolver;

pub use error::{RunError, RunErrorKind};
pub use observer::{observer_fn, FnObserver, MessageCollector, NoopObserver, RunObserver};
pub use resolver::{RunConfig, RunPhase, RunReport, RunResolver, RunState, DEFAULT_MAX_SUBMISSIONS};

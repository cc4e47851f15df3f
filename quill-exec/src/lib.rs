//! Running the code inside interactive blocks.
//!
//! Every supported language is sent to a remote execution service. JavaScript
//! also has a local sandbox, used when the service cannot be reached. Each
//! block on a page owns a [`CodeRunner`] that allows one run at a time.

pub mod error;
pub mod language;
pub mod local;
pub mod outcome;
pub mod remote;
pub mod runner;
pub mod strategy;

pub use error::{RunError, StrategyError};
pub use language::{Language, SUPPORTED_LANGUAGES, lookup_language};
pub use local::LocalStrategy;
pub use outcome::{NO_OUTPUT, RunOutcome, RunResult};
pub use remote::RemoteStrategy;
pub use runner::{CodeRunner, Executor, RunState};
pub use strategy::ExecutionStrategy;

//! Orchestration of asynchronous model-customization jobs that report their
//! outcome through a one-shot callback token.

pub mod callback;
pub mod config;
pub mod error;
pub mod finalizer;
pub mod launcher;
pub mod orchestrator;
pub mod poller;
pub mod provider;
pub mod router;
pub mod state_machine;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use config::TunerConfig;
pub use error::TunerError;
pub use launcher::TokioLauncher;
pub use orchestrator::{WorkflowRunner, WorkflowSettings};
pub use router::{CallbackRouter, Dispatch, QueueMessage, WorkflowLauncher};

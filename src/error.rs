use thiserror::Error;

use crate::callback::CallbackError;
use crate::provider::ProviderError;
use crate::state_machine::JobState;

#[derive(Debug, Error)]
pub enum TunerError {
    #[error("Job submission rejected for {job_name}: {source}")]
    Submission {
        job_name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Status poll failed for {job_name}: {source}")]
    Poll {
        job_name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Callback rejected: {0}")]
    Finalize(#[from] CallbackError),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid transition from {state}: {event}")]
    InvalidTransition { state: JobState, event: String },

    #[error("Job {job_name} still in progress after {cycles} poll cycles")]
    PollLimitExceeded { job_name: String, cycles: u32 },

    #[error("Execution {0} is already running")]
    Duplicate(String),

    #[error("Workflow launch failed: {0}")]
    Launch(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TunerError {
    pub fn missing(field: &str) -> Self {
        TunerError::MissingField(field.to_string())
    }
}

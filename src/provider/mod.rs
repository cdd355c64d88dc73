pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpTrainingClient, TrainingProvider};
pub use error::ProviderError;
pub use types::{
    CreateJobRequest, CreateJobResponse, DataConfig, JobDetails, JobSummary, RawJobStatus, Tag,
    ValidationDataConfig,
};

//! Starts model-customization jobs on the training provider.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::TunerError;
use crate::provider::{
    CreateJobRequest, DataConfig, ProviderError, Tag, TrainingProvider, ValidationDataConfig,
};
use crate::state_machine::{JobHandle, TuningRequest};

/// Submits tuning requests under a deterministic job name.
#[derive(Clone)]
pub struct JobSubmitter {
    provider: Arc<dyn TrainingProvider>,
    role_arn: String,
    region: String,
}

impl JobSubmitter {
    pub fn new(provider: Arc<dyn TrainingProvider>, role_arn: String, region: String) -> Self {
        Self {
            provider,
            role_arn,
            region,
        }
    }

    /// Build the provider request for `req`.
    pub fn build_request(&self, req: &TuningRequest) -> CreateJobRequest {
        CreateJobRequest {
            job_name: req.job_name(),
            custom_model_name: req.custom_model_name(),
            role_arn: self.role_arn.clone(),
            base_model_identifier: req.base_model_identifier(&self.region),
            training_data_config: DataConfig::new(req.training_data_uri()),
            validation_data_config: ValidationDataConfig {
                validators: vec![DataConfig::new(req.validation_data_uri())],
            },
            output_data_config: DataConfig::new(req.output_data_uri()),
            hyper_parameters: req.hyper_parameters(),
            custom_model_tags: vec![Tag {
                key: "ExecutionID".into(),
                value: req.execution_id.clone(),
            }],
        }
    }

    /// Create the job and return its handle.
    ///
    /// A name conflict means the same execution was already submitted; the
    /// existing job is adopted instead of failing. Every other rejection is a
    /// `Submission` error and must abort the workflow.
    pub async fn submit(&self, req: &TuningRequest) -> Result<JobHandle, TunerError> {
        req.validate()?;
        let create = self.build_request(req);
        let job_name = create.job_name.clone();
        info!(job_name = %job_name, base_model = %req.base_model, "Starting fine-tuning job");

        match self.provider.create_job(&create).await {
            Ok(resp) => {
                info!(job_name = %job_name, job_arn = %resp.job_arn, "Tuning job created");
                Ok(JobHandle {
                    job_name,
                    job_arn: resp.job_arn,
                })
            }
            Err(ProviderError::Conflict(message)) => {
                warn!(job_name = %job_name, %message, "Job already exists, adopting it");
                let existing = self
                    .provider
                    .get_job(&job_name)
                    .await
                    .map_err(|source| TunerError::Submission {
                        job_name: job_name.clone(),
                        source,
                    })?;
                Ok(JobHandle {
                    job_name,
                    job_arn: existing.job_arn,
                })
            }
            Err(source) => Err(TunerError::Submission { job_name, source }),
        }
    }
}

//! Reports a finished job back to the caller holding the callback token.

use std::sync::Arc;

use tracing::info;

use crate::callback::{CallbackSender, OutputParameter};
use crate::error::TunerError;
use crate::poller::StatusPoller;
use crate::provider::{JobDetails, RawJobStatus};
use crate::state_machine::{JobState, WorkflowContext};

pub const MANUAL_STOP_REASON: &str = "Model customization has been manually stopped";
pub const DEFAULT_FAILURE_REASON: &str = "Model customization failed";

/// What was reported on the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackReport {
    Success(Vec<OutputParameter>),
    Failure(String),
}

/// The six named outputs of a successful job, in reporting order.
pub fn success_outputs(details: &JobDetails) -> Result<Vec<OutputParameter>, TunerError> {
    fn required(value: Option<&str>, field: &str) -> Result<String, TunerError> {
        match value {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(TunerError::missing(field)),
        }
    }

    Ok(vec![
        OutputParameter::new(
            "OUTPUT_MODEL_NAME",
            required(details.output_model_name.as_deref(), "outputModelName")?,
        ),
        OutputParameter::new(
            "OUTPUT_MODEL_ARN",
            required(details.output_model_arn.as_deref(), "outputModelArn")?,
        ),
        OutputParameter::new("JOB_NAME", required(Some(details.job_name.as_str()), "jobName")?),
        OutputParameter::new("JOB_ARN", required(Some(details.job_arn.as_str()), "jobArn")?),
        OutputParameter::new(
            "BASE_MODEL_ARN",
            required(details.base_model_arn.as_deref(), "baseModelArn")?,
        ),
        OutputParameter::new(
            "OUTPUT_DATA",
            required(
                details.output_data_config.as_ref().map(|c| c.s3_uri.as_str()),
                "outputDataConfig.s3Uri",
            )?,
        ),
    ])
}

/// Human-readable reason for a failed or stopped job.
pub fn failure_reason(details: &JobDetails) -> String {
    if details.status == RawJobStatus::Stopped {
        return MANUAL_STOP_REASON.to_string();
    }
    details
        .failure_message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string())
}

#[derive(Clone)]
pub struct CallbackFinalizer {
    poller: StatusPoller,
    callbacks: Arc<dyn CallbackSender>,
}

impl CallbackFinalizer {
    pub fn new(poller: StatusPoller, callbacks: Arc<dyn CallbackSender>) -> Self {
        Self { poller, callbacks }
    }

    /// Report the outcome of a terminal workflow.
    ///
    /// Consumes the context: its token can only be spent once. A rejected
    /// token surfaces as `TunerError::Finalize` and must not be retried.
    pub async fn finalize(&self, ctx: WorkflowContext) -> Result<CallbackReport, TunerError> {
        if !ctx.status.is_terminal() {
            return Err(TunerError::InvalidTransition {
                state: ctx.status,
                event: "finalize".into(),
            });
        }
        let job_name = ctx.require_job_name()?;

        // The poll response does not carry the output artifacts.
        let details = self.poller.details(job_name).await?;
        info!(job_name, raw = %details.status, "Fetched tuning job details");

        let report = if ctx.status == JobState::Completed {
            let outputs = success_outputs(&details)?;
            info!(job_name, "Sending SUCCESSFUL callback");
            self.callbacks.send_success(&ctx.token, &outputs).await?;
            CallbackReport::Success(outputs)
        } else {
            let reason = failure_reason(&details);
            info!(job_name, reason = %reason, "Sending FAILED callback");
            self.callbacks.send_failure(&ctx.token, &reason).await?;
            CallbackReport::Failure(reason)
        };

        Ok(report)
    }
}

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::state::JobState;
use crate::error::TunerError;

/// Input parameters for a fine-tuning job, as carried in queue messages.
///
/// Hyperparameters stay strings because the training API takes a string map;
/// numeric JSON values are accepted and stringified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TuningRequest {
    pub job_prefix: String,
    pub execution_id: String,
    pub base_model: String,
    pub train_data: String,
    pub validation_data: String,
    pub data_bucket: String,
    #[serde(deserialize_with = "string_or_number")]
    pub epochs: String,
    #[serde(deserialize_with = "string_or_number")]
    pub batch_size: String,
    #[serde(deserialize_with = "string_or_number")]
    pub learning_rate: String,
    #[serde(deserialize_with = "string_or_number")]
    pub warmup_steps: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl TuningRequest {
    /// `<prefix>-TuningJob-<executionId>`; identical inputs always yield the same name.
    pub fn job_name(&self) -> String {
        format!("{}-TuningJob-{}", self.job_prefix, self.execution_id)
    }

    pub fn custom_model_name(&self) -> String {
        format!("{}-{}", self.job_prefix, self.execution_id)
    }

    pub fn base_model_identifier(&self, region: &str) -> String {
        format!(
            "arn:aws:bedrock:{region}::foundation-model/{}",
            self.base_model
        )
    }

    // The preprocessing step always writes `data.jsonl`.
    pub fn training_data_uri(&self) -> String {
        format!("{}/data.jsonl", self.train_data)
    }

    pub fn validation_data_uri(&self) -> String {
        format!("{}/data.jsonl", self.validation_data)
    }

    pub fn output_data_uri(&self) -> String {
        format!("s3://{}/{}", self.data_bucket, self.execution_id)
    }

    pub fn hyper_parameters(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("epochCount".to_string(), self.epochs.clone()),
            ("batchSize".to_string(), self.batch_size.clone()),
            ("learningRate".to_string(), self.learning_rate.clone()),
            (
                "learningRateWarmupSteps".to_string(),
                self.warmup_steps.clone(),
            ),
        ])
    }

    /// Reject requests whose naming fields are blank.
    pub fn validate(&self) -> Result<(), TunerError> {
        let required = [
            ("JOB_PREFIX", &self.job_prefix),
            ("EXECUTION_ID", &self.execution_id),
            ("BASE_MODEL", &self.base_model),
            ("TRAIN_DATA", &self.train_data),
            ("VALIDATION_DATA", &self.validation_data),
            ("DATA_BUCKET", &self.data_bucket),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(TunerError::missing(name));
            }
        }
        Ok(())
    }
}

/// Identifies a provider-side training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_name: String,
    pub job_arn: String,
}

/// Single-use credential for reporting a workflow outcome.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackToken(String);

impl CallbackToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "CallbackToken({prefix}…)")
    }
}

/// The envelope threaded through every workflow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TuningRequest>,
    pub token: CallbackToken,
}

impl WorkflowContext {
    /// A fresh context in the `Start` state.
    pub fn start(parameters: TuningRequest, token: CallbackToken) -> Self {
        Self {
            status: JobState::Start,
            job_name: None,
            job_arn: None,
            parameters: Some(parameters),
            token,
        }
    }

    /// Parse a step payload, rejecting it before any transition if a
    /// required field is absent.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, TunerError> {
        for field in ["status", "token"] {
            if payload.get(field).is_none_or(|v| v.is_null()) {
                return Err(TunerError::missing(field));
            }
        }
        Ok(serde_json::from_value(payload)?)
    }

    pub fn require_job_name(&self) -> Result<&str, TunerError> {
        self.job_name
            .as_deref()
            .ok_or_else(|| TunerError::missing("jobName"))
    }

    pub fn require_parameters(&self) -> Result<&TuningRequest, TunerError> {
        self.parameters
            .as_ref()
            .ok_or_else(|| TunerError::missing("parameters"))
    }
}

/// Backoff settings for transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries before giving up on a call.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given retry attempt using exponential backoff.
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Summary of a finished workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub execution_id: String,
    pub job_name: Option<String>,
    pub final_state: JobState,
    pub state_transitions: Vec<JobState>,
    pub poll_count: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl WorkflowRecord {
    pub fn new(
        execution_id: String,
        job_name: Option<String>,
        state_transitions: Vec<JobState>,
        poll_count: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        let final_state = state_transitions.last().copied().unwrap_or(JobState::Start);
        Self {
            execution_id,
            job_name,
            final_state,
            state_transitions,
            poll_count,
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds(),
        }
    }
}

//! In-memory fakes for the provider, callback and launcher seams.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::callback::{CallbackError, CallbackSender, OutputParameter};
use crate::error::TunerError;
use crate::finalizer::CallbackReport;
use crate::provider::{
    CreateJobRequest, CreateJobResponse, JobDetails, JobSummary, ProviderError, RawJobStatus,
    TrainingProvider,
};
use crate::router::WorkflowLauncher;
use crate::state_machine::{CallbackToken, TuningRequest, WorkflowContext};

pub fn tuning_request(execution_id: &str) -> TuningRequest {
    TuningRequest {
        job_prefix: "npc-dialogue".into(),
        execution_id: execution_id.into(),
        base_model: "amazon.titan-text-express-v1".into(),
        train_data: "s3://tuning-data/train".into(),
        validation_data: "s3://tuning-data/validation".into(),
        data_bucket: "tuning-data".into(),
        epochs: "2".into(),
        batch_size: "1".into(),
        learning_rate: "0.00001".into(),
        warmup_steps: "0".into(),
    }
}

pub fn job_arn(job_name: &str) -> String {
    format!("arn:aws:bedrock:us-east-1:123456789012:model-customization-job/{job_name}")
}

#[derive(Default)]
struct ProviderState {
    created: Vec<CreateJobRequest>,
    jobs: HashMap<String, JobDetails>,
    model_names: HashMap<String, String>,
    scripts: HashMap<String, VecDeque<RawJobStatus>>,
    create_error: Option<ProviderError>,
    get_errors: VecDeque<ProviderError>,
    get_calls: u32,
}

/// A training provider whose job statuses follow a per-job script.
///
/// Each `get_job` call advances the job to the next scripted status; once the
/// script runs out the job keeps its last status. Creating a job whose name
/// already exists returns `Conflict`, like a provider that deduplicates by name.
#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<ProviderState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_create(&self, err: ProviderError) {
        self.state.lock().unwrap().create_error = Some(err);
    }

    pub fn push_get_error(&self, err: ProviderError) {
        self.state.lock().unwrap().get_errors.push_back(err);
    }

    pub fn script(&self, job_name: &str, statuses: &[&str]) {
        self.state.lock().unwrap().scripts.insert(
            job_name.to_string(),
            statuses.iter().map(|s| RawJobStatus::from(*s)).collect(),
        );
    }

    /// Insert a job directly, bypassing `create_job`.
    pub fn insert_job(&self, details: JobDetails) {
        self.state
            .lock()
            .unwrap()
            .jobs
            .insert(details.job_name.clone(), details);
    }

    pub fn created(&self) -> Vec<CreateJobRequest> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn get_calls(&self) -> u32 {
        self.state.lock().unwrap().get_calls
    }
}

#[async_trait]
impl TrainingProvider for FakeProvider {
    async fn create_job(&self, req: &CreateJobRequest) -> Result<CreateJobResponse, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.create_error.take() {
            return Err(err);
        }
        if state.jobs.contains_key(&req.job_name) {
            return Err(ProviderError::Conflict(format!(
                "Job {} already exists",
                req.job_name
            )));
        }

        let arn = job_arn(&req.job_name);
        state.created.push(req.clone());
        state
            .model_names
            .insert(req.job_name.clone(), req.custom_model_name.clone());
        state.jobs.insert(
            req.job_name.clone(),
            JobDetails {
                job_name: req.job_name.clone(),
                job_arn: arn.clone(),
                status: RawJobStatus::InProgress,
                output_model_name: None,
                output_model_arn: None,
                base_model_arn: Some(req.base_model_identifier.clone()),
                output_data_config: Some(req.output_data_config.clone()),
                failure_message: None,
                creation_time: None,
                end_time: None,
            },
        );
        Ok(CreateJobResponse { job_arn: arn })
    }

    async fn get_job(&self, job_identifier: &str) -> Result<JobDetails, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if let Some(err) = state.get_errors.pop_front() {
            return Err(err);
        }

        let next = state
            .scripts
            .get_mut(job_identifier)
            .and_then(|script| script.pop_front());
        let model_name = state.model_names.get(job_identifier).cloned();
        let details = state
            .jobs
            .get_mut(job_identifier)
            .ok_or_else(|| ProviderError::NotFound(job_identifier.to_string()))?;

        if let Some(status) = next {
            details.status = status;
        }
        match details.status {
            RawJobStatus::Completed if details.output_model_name.is_none() => {
                let name = model_name.unwrap_or_else(|| format!("{job_identifier}-model"));
                details.output_model_arn = Some(format!(
                    "arn:aws:bedrock:us-east-1:123456789012:custom-model/{name}"
                ));
                details.output_model_name = Some(name);
            }
            RawJobStatus::Failed if details.failure_message.is_none() => {
                details.failure_message = Some("Training loss diverged".into());
            }
            _ => {}
        }
        Ok(details.clone())
    }

    async fn list_jobs(&self, max_results: u32) -> Result<Vec<JobSummary>, ProviderError> {
        let state = self.state.lock().unwrap();
        let mut jobs: Vec<JobSummary> = state
            .jobs
            .values()
            .map(|d| JobSummary {
                job_name: d.job_name.clone(),
                job_arn: d.job_arn.clone(),
                status: d.status.clone(),
                creation_time: d.creation_time,
            })
            .collect();
        jobs.sort_by(|a, b| a.job_name.cmp(&b.job_name));
        jobs.truncate(max_results as usize);
        Ok(jobs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReport {
    pub token: String,
    pub report: CallbackReport,
}

/// Callback sender that records reports and rejects reused tokens.
#[derive(Default)]
pub struct FakeCallbacks {
    reports: Mutex<Vec<RecordedReport>>,
    consumed: Mutex<HashSet<String>>,
}

impl FakeCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<RecordedReport> {
        self.reports.lock().unwrap().clone()
    }

    fn consume(&self, token: &CallbackToken, report: CallbackReport) -> Result<(), CallbackError> {
        if !self.consumed.lock().unwrap().insert(token.as_str().to_string()) {
            return Err(CallbackError::TokenRejected {
                message: "Callback token has already been used".into(),
            });
        }
        self.reports.lock().unwrap().push(RecordedReport {
            token: token.as_str().to_string(),
            report,
        });
        Ok(())
    }
}

#[async_trait]
impl CallbackSender for FakeCallbacks {
    async fn send_success(
        &self,
        token: &CallbackToken,
        outputs: &[OutputParameter],
    ) -> Result<(), CallbackError> {
        self.consume(token, CallbackReport::Success(outputs.to_vec()))
    }

    async fn send_failure(&self, token: &CallbackToken, reason: &str) -> Result<(), CallbackError> {
        self.consume(token, CallbackReport::Failure(reason.to_string()))
    }
}

/// Launcher that records started contexts without running them.
#[derive(Default)]
pub struct RecordingLauncher {
    started: Mutex<Vec<WorkflowContext>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<WorkflowContext> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowLauncher for RecordingLauncher {
    async fn start(&self, ctx: WorkflowContext) -> Result<String, TunerError> {
        let mut started = self.started.lock().unwrap();
        started.push(ctx);
        Ok(format!("execution-{}", started.len()))
    }
}

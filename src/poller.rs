//! Queries job status and reduces raw provider states to workflow states.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::TunerError;
use crate::provider::{JobDetails, ProviderError, RawJobStatus, TrainingProvider};
use crate::state_machine::{JobState, RetryConfig};

/// Map a raw provider state onto the three states the workflow distinguishes.
///
/// Manual stops count as failures.
pub fn classify(raw: &RawJobStatus) -> JobState {
    match raw {
        RawJobStatus::Failed | RawJobStatus::Stopped | RawJobStatus::Stopping => JobState::Failed,
        RawJobStatus::Completed => JobState::Completed,
        RawJobStatus::InProgress | RawJobStatus::Other(_) => JobState::InProgress,
    }
}

/// Backoff for `attempt`, never shorter than a server-requested `retry-after`.
fn retry_delay_ms(retry: &RetryConfig, err: &ProviderError, attempt: u32) -> u64 {
    let backoff = retry.delay_for_attempt(attempt);
    match err {
        ProviderError::Throttled { retry_after_ms } => backoff.max(*retry_after_ms),
        _ => backoff,
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    provider: Arc<dyn TrainingProvider>,
    retry: RetryConfig,
}

impl StatusPoller {
    pub fn new(provider: Arc<dyn TrainingProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    /// Fetch job details, retrying transient provider errors with backoff.
    pub async fn details(&self, job_name: &str) -> Result<JobDetails, TunerError> {
        let mut attempt = 0;
        loop {
            match self.provider.get_job(job_name).await {
                Ok(details) => return Ok(details),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay_ms = retry_delay_ms(&self.retry, &e, attempt);
                    warn!(
                        job_name,
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms,
                        error = %e,
                        "Status query failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(source) => {
                    return Err(TunerError::Poll {
                        job_name: job_name.to_string(),
                        source,
                    });
                }
            }
        }
    }

    /// Current classified state of the job.
    pub async fn poll(&self, job_name: &str) -> Result<JobState, TunerError> {
        info!(job_name, "Checking tuning job status");
        let details = self.details(job_name).await?;
        let state = classify(&details.status);
        info!(job_name, raw = %details.status, status = %state, "Tuning status");
        Ok(state)
    }
}

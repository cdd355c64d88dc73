use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};

use super::error::ProviderError;
use super::types::{CreateJobRequest, CreateJobResponse, JobDetails, JobSummary, ListJobsResponse};

const JOBS_PATH: &str = "model-customization-jobs";

/// Operations the orchestrator needs from the asynchronous training service.
#[async_trait]
pub trait TrainingProvider: Send + Sync {
    /// Start a model-customization job.
    async fn create_job(&self, req: &CreateJobRequest) -> Result<CreateJobResponse, ProviderError>;

    /// Fetch the full details of a job by name or ARN.
    async fn get_job(&self, job_identifier: &str) -> Result<JobDetails, ProviderError>;

    /// List the most recent jobs.
    async fn list_jobs(&self, max_results: u32) -> Result<Vec<JobSummary>, ProviderError>;
}

pub struct HttpTrainingClient {
    token: String,
    client: Client,
    jobs_url: Url,
}

impl HttpTrainingClient {
    pub fn new(base_url: String, token: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        let jobs_url = Url::parse(&format!("{}/{JOBS_PATH}", base_url.trim_end_matches('/')))
            .map_err(|e| ProviderError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if jobs_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidEndpoint(base_url));
        }
        Ok(Self {
            token,
            client,
            jobs_url,
        })
    }

    /// `{jobs}/{identifier}` with the identifier kept as one path segment,
    /// so an ARN's `/` is percent-encoded.
    fn job_url(&self, job_identifier: &str) -> Result<Url, ProviderError> {
        let mut url = self.jobs_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidEndpoint(self.jobs_url.to_string()))?
            .push(job_identifier);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            req
        } else {
            req.bearer_auth(&self.token)
        }
    }
}

#[async_trait]
impl TrainingProvider for HttpTrainingClient {
    async fn create_job(&self, req: &CreateJobRequest) -> Result<CreateJobResponse, ProviderError> {
        let response = self
            .authorize(self.client.post(self.jobs_url.clone()))
            .json(req)
            .send()
            .await?;

        let body = check_response(response).await?.json::<CreateJobResponse>().await?;
        Ok(body)
    }

    async fn get_job(&self, job_identifier: &str) -> Result<JobDetails, ProviderError> {
        let url = self.job_url(job_identifier)?;
        let response = self.authorize(self.client.get(url)).send().await?;

        let body = check_response(response).await?.json::<JobDetails>().await?;
        Ok(body)
    }

    async fn list_jobs(&self, max_results: u32) -> Result<Vec<JobSummary>, ProviderError> {
        let response = self
            .authorize(self.client.get(self.jobs_url.clone()))
            .query(&[("maxResults", max_results)])
            .send()
            .await?;

        let body = check_response(response).await?.json::<ListJobsResponse>().await?;
        Ok(body.model_customization_job_summaries)
    }
}

/// Map non-success HTTP statuses onto `ProviderError` variants.
async fn check_response(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000)
            .unwrap_or(1000);
        return Err(ProviderError::Throttled {
            retry_after_ms: retry_after,
        });
    }

    if status.is_success() {
        return Ok(response);
    }

    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let message = error_message(&text);

    Err(match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        StatusCode::CONFLICT => ProviderError::Conflict(message),
        _ => ProviderError::ApiError {
            status: status.as_u16(),
            message,
        },
    })
}

/// Pull the `message` field out of a JSON error body, falling back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

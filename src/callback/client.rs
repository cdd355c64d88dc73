use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::error::CallbackError;
use crate::provider::client::error_message;
use crate::state_machine::CallbackToken;

const SUCCESS_TARGET: &str = "SageMaker.SendPipelineExecutionStepSuccess";
const FAILURE_TARGET: &str = "SageMaker.SendPipelineExecutionStepFailure";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// A named output reported back to the waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputParameter {
    pub name: String,
    pub value: String,
}

impl OutputParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StepSuccessRequest<'a> {
    callback_token: &'a str,
    output_parameters: &'a [OutputParameter],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StepFailureRequest<'a> {
    callback_token: &'a str,
    failure_reason: &'a str,
}

/// Reports the outcome of a workflow to the caller holding the token.
///
/// Each token accepts exactly one report; the remote side enforces this.
#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send_success(
        &self,
        token: &CallbackToken,
        outputs: &[OutputParameter],
    ) -> Result<(), CallbackError>;

    async fn send_failure(&self, token: &CallbackToken, reason: &str) -> Result<(), CallbackError>;
}

pub struct HttpCallbackClient {
    client: Client,
    endpoint: String,
}

impl HttpCallbackClient {
    pub fn new(endpoint: String) -> Result<Self, CallbackError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, endpoint })
    }

    async fn post<T: Serialize + ?Sized>(&self, target: &str, body: &T) -> Result<(), CallbackError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-amz-target", target)
            .header("content-type", CONTENT_TYPE)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let message = error_message(&text);

        // Auth failures and throttling say nothing about the token itself.
        let token_untouched = matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        );
        if status.is_client_error() && !token_untouched {
            return Err(CallbackError::TokenRejected { message });
        }
        Err(CallbackError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackClient {
    async fn send_success(
        &self,
        token: &CallbackToken,
        outputs: &[OutputParameter],
    ) -> Result<(), CallbackError> {
        let body = StepSuccessRequest {
            callback_token: token.as_str(),
            output_parameters: outputs,
        };
        self.post(SUCCESS_TARGET, &body).await
    }

    async fn send_failure(&self, token: &CallbackToken, reason: &str) -> Result<(), CallbackError> {
        let body = StepFailureRequest {
            callback_token: token.as_str(),
            failure_reason: reason,
        };
        self.post(FAILURE_TARGET, &body).await
    }
}

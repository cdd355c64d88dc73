use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::callback::CallbackSender;
use crate::error::TunerError;
use crate::state_machine::{CallbackToken, TuningRequest, WorkflowContext};

pub const MANUAL_STOPPING_REASON: &str = "Manual Stopping Behavior";

/// Status carried by a queue message. Anything other than `Stopping` starts a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    Start,
    Stopping,
    #[serde(other)]
    Other,
}

/// A "job requested" or "job stop requested" message from the input queue.
///
/// `arguments` stays raw JSON until a workflow is started; stop requests
/// never look at it.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueMessage {
    pub status: MessageStatus,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
    pub token: CallbackToken,
}

impl QueueMessage {
    /// Parse a message body, rejecting it if `status` or `token` is absent.
    pub fn parse(body: &str) -> Result<Self, TunerError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        for field in ["status", "token"] {
            if value.get(field).is_none_or(|v| v.is_null()) {
                return Err(TunerError::missing(field));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The tuning request carried by a start message.
    pub fn tuning_request(&self) -> Result<TuningRequest, TunerError> {
        match &self.arguments {
            Some(args) if !args.is_null() => Ok(serde_json::from_value(args.clone())?),
            _ => Err(TunerError::missing("arguments")),
        }
    }
}

/// Split a delivered batch into individual message bodies.
///
/// Accepts a queue event envelope (`{"Records": [{"body": "..."}]}`), a JSON
/// array of messages, or a single message object.
pub fn split_batch(input: &str) -> Result<Vec<String>, TunerError> {
    let value: serde_json::Value = serde_json::from_str(input)?;

    if let Some(records) = value.get("Records").and_then(|r| r.as_array()) {
        return records
            .iter()
            .map(|record| match record.get("body") {
                Some(serde_json::Value::String(body)) => Ok(body.clone()),
                Some(other) => Ok(other.to_string()),
                None => Err(TunerError::missing("Records[].body")),
            })
            .collect();
    }

    match value {
        serde_json::Value::Array(items) => Ok(items.iter().map(|v| v.to_string()).collect()),
        other => Ok(vec![other.to_string()]),
    }
}

/// Acknowledgement returned for each routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A new workflow instance was started.
    Started { execution_id: String },
    /// The stop request was answered with a failure callback.
    Stopped,
}

/// Host scheduler that runs workflow instances independently of the router.
#[async_trait]
pub trait WorkflowLauncher: Send + Sync {
    /// Start a workflow for `ctx` and return its execution id without waiting for it.
    async fn start(&self, ctx: WorkflowContext) -> Result<String, TunerError>;
}

/// Starts or aborts workflows in response to queue messages.
pub struct CallbackRouter {
    launcher: Arc<dyn WorkflowLauncher>,
    callbacks: Arc<dyn CallbackSender>,
}

impl CallbackRouter {
    pub fn new(launcher: Arc<dyn WorkflowLauncher>, callbacks: Arc<dyn CallbackSender>) -> Self {
        Self {
            launcher,
            callbacks,
        }
    }

    /// Route one message.
    ///
    /// `Stopping` never starts a workflow: the token is failed immediately.
    /// Every other status starts a new instance in the `Start` state.
    pub async fn dispatch(&self, msg: QueueMessage) -> Result<Dispatch, TunerError> {
        match msg.status {
            MessageStatus::Stopping => {
                info!("Stop requested, sending failure callback");
                self.callbacks
                    .send_failure(&msg.token, MANUAL_STOPPING_REASON)
                    .await?;
                Ok(Dispatch::Stopped)
            }
            MessageStatus::Start | MessageStatus::Other => {
                let parameters = msg.tuning_request()?;
                info!(
                    job_prefix = %parameters.job_prefix,
                    request_id = %parameters.execution_id,
                    "Starting tuning workflow"
                );
                let ctx = WorkflowContext::start(parameters, msg.token);
                let execution_id = self.launcher.start(ctx).await?;
                info!(execution_id = %execution_id, "Workflow execution started");
                Ok(Dispatch::Started { execution_id })
            }
        }
    }

    pub async fn dispatch_body(&self, body: &str) -> Result<Dispatch, TunerError> {
        self.dispatch(QueueMessage::parse(body)?).await
    }
}

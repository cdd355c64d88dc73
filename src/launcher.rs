//! In-process host scheduler: each workflow runs as its own tokio task.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::error;
use uuid::Uuid;

use crate::error::TunerError;
use crate::orchestrator::WorkflowRunner;
use crate::router::WorkflowLauncher;
use crate::state_machine::{WorkflowContext, WorkflowRecord};

type WorkflowHandle = JoinHandle<Result<WorkflowRecord, TunerError>>;
type RunningSet = Arc<StdMutex<HashSet<String>>>;

/// Holds a request execution id in the running set until dropped, including
/// when the workflow task panics.
struct RunningEntry {
    running: RunningSet,
    request_id: String,
}

impl Drop for RunningEntry {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.request_id);
    }
}

pub struct TokioLauncher {
    runner: Arc<WorkflowRunner>,
    /// Reject a Start whose request execution id is still running.
    dedupe: bool,
    running: RunningSet,
    handles: Mutex<Vec<(String, WorkflowHandle)>>,
}

impl TokioLauncher {
    pub fn new(runner: Arc<WorkflowRunner>, dedupe: bool) -> Self {
        Self {
            runner,
            dedupe,
            running: Arc::new(StdMutex::new(HashSet::new())),
            handles: Mutex::new(Vec::new()),
        }
    }

    fn claim(&self, request_id: &str) -> Result<RunningEntry, TunerError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(request_id.to_string()) {
            return Err(TunerError::Duplicate(request_id.to_string()));
        }
        Ok(RunningEntry {
            running: self.running.clone(),
            request_id: request_id.to_string(),
        })
    }

    /// Wait for every workflow launched so far and collect their results.
    pub async fn join_all(&self) -> Vec<(String, Result<WorkflowRecord, TunerError>)> {
        let handles = std::mem::take(&mut *self.handles.lock().await);
        let mut results = Vec::with_capacity(handles.len());
        for (execution_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(TunerError::Launch(e.to_string())),
            };
            results.push((execution_id, result));
        }
        results
    }
}

#[async_trait]
impl WorkflowLauncher for TokioLauncher {
    async fn start(&self, ctx: WorkflowContext) -> Result<String, TunerError> {
        let entry = match (&ctx.parameters, self.dedupe) {
            (Some(parameters), true) => Some(self.claim(&parameters.execution_id)?),
            _ => None,
        };

        let execution_id = Uuid::new_v4().to_string();
        let runner = self.runner.clone();
        let id = execution_id.clone();

        let handle = tokio::spawn(async move {
            let _entry = entry;
            let result = runner.run(&id, ctx).await;
            if let Err(e) = &result {
                error!(execution_id = %id, error = %e, "Workflow failed");
            }
            result
        });

        self.handles.lock().await.push((execution_id.clone(), handle));
        Ok(execution_id)
    }
}

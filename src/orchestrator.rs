use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::callback::CallbackSender;
use crate::config::TunerConfig;
use crate::error::TunerError;
use crate::finalizer::{CallbackFinalizer, CallbackReport};
use crate::poller::StatusPoller;
use crate::provider::TrainingProvider;
use crate::state_machine::{Event, JobState, StateMachine, WorkflowContext, WorkflowRecord};
use crate::submitter::JobSubmitter;

/// Timing of the wait/poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Fixed wait before every status poll.
    pub poll_interval: Duration,
    /// Opt-in ceiling on poll cycles. `None` trusts the provider's own job timeout.
    pub max_poll_cycles: Option<u32>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(600),
            max_poll_cycles: None,
        }
    }
}

impl From<&TunerConfig> for WorkflowSettings {
    fn from(config: &TunerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_poll_cycles: config.max_poll_cycles,
        }
    }
}

/// Drives tuning workflows through the state machine.
pub struct WorkflowRunner {
    submitter: JobSubmitter,
    poller: StatusPoller,
    finalizer: CallbackFinalizer,
    settings: WorkflowSettings,
}

impl WorkflowRunner {
    pub fn new(
        provider: Arc<dyn TrainingProvider>,
        callbacks: Arc<dyn CallbackSender>,
        config: &TunerConfig,
    ) -> Self {
        let poller = StatusPoller::new(provider.clone(), config.retry_config());
        Self {
            submitter: JobSubmitter::new(provider, config.role_arn.clone(), config.region.clone()),
            finalizer: CallbackFinalizer::new(poller.clone(), callbacks),
            poller,
            settings: WorkflowSettings::from(config),
        }
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// Perform exactly one step for the context's current status.
    ///
    /// `Start` submits the job, `InProgress` polls it once, and a terminal
    /// status reports the outcome on the token. Returns the updated context,
    /// or `None` once the workflow has been finalized.
    pub async fn handle_step(
        &self,
        ctx: WorkflowContext,
    ) -> Result<Option<WorkflowContext>, TunerError> {
        if ctx.status.is_terminal() {
            self.finalizer.finalize(ctx).await?;
            return Ok(None);
        }
        self.advance(ctx).await.map(Some)
    }

    async fn advance(&self, mut ctx: WorkflowContext) -> Result<WorkflowContext, TunerError> {
        let event = match ctx.status {
            JobState::Start => {
                let handle = self.submitter.submit(ctx.require_parameters()?).await?;
                Event::Submitted(handle)
            }
            JobState::InProgress => {
                let polled = self.poller.poll(ctx.require_job_name()?).await?;
                Event::Polled(polled)
            }
            state => {
                return Err(TunerError::InvalidTransition {
                    state,
                    event: "advance".into(),
                });
            }
        };
        StateMachine::next(&mut ctx, event)?;
        Ok(ctx)
    }

    /// Run a workflow to completion: submit, then wait and poll until the job
    /// is terminal, then report on the token.
    ///
    /// Also resumes a context that is already `InProgress`. There is no overall
    /// time limit unless `max_poll_cycles` is set.
    pub async fn run(
        &self,
        execution_id: &str,
        mut ctx: WorkflowContext,
    ) -> Result<WorkflowRecord, TunerError> {
        let started_at = Utc::now();
        let mut history = vec![ctx.status];
        let mut polls: u32 = 0;
        info!(execution_id, status = %ctx.status, "Workflow started");

        while !ctx.status.is_terminal() {
            if ctx.status == JobState::InProgress {
                if let Some(max) = self.settings.max_poll_cycles {
                    if polls >= max {
                        let job_name = ctx.job_name.unwrap_or_default();
                        warn!(execution_id, job_name = %job_name, polls, "Poll limit reached");
                        return Err(TunerError::PollLimitExceeded {
                            job_name,
                            cycles: polls,
                        });
                    }
                }
                sleep(self.settings.poll_interval).await;
                polls += 1;
            }

            ctx = self.advance(ctx).await?;
            if history.last() != Some(&ctx.status) {
                history.push(ctx.status);
            }
        }

        let job_name = ctx.job_name.clone();
        let report = self.finalizer.finalize(ctx).await?;
        let record = WorkflowRecord::new(
            execution_id.to_string(),
            job_name,
            history,
            polls,
            started_at,
        );
        info!(
            execution_id,
            final_state = %record.final_state,
            polls,
            success = matches!(report, CallbackReport::Success(_)),
            "Workflow finished"
        );
        Ok(record)
    }
}

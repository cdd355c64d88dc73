use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::{JobHandle, WorkflowContext};
use crate::error::TunerError;

/// The four states of the tuning workflow.
///
/// Each workflow flows through: Start → InProgress → (Completed | Failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Start,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Start => write!(f, "Start"),
            JobState::InProgress => write!(f, "InProgress"),
            JobState::Completed => write!(f, "Completed"),
            JobState::Failed => write!(f, "Failed"),
        }
    }
}

/// What just happened to the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The provider accepted the job.
    Submitted(JobHandle),
    /// A status poll returned this classified state.
    Polled(JobState),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Submitted(handle) => write!(f, "submitted {}", handle.job_name),
            Event::Polled(state) => write!(f, "polled {state}"),
        }
    }
}

/// The result of evaluating a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the next non-terminal state.
    Next(JobState),
    /// Stay in `InProgress`; wait and poll again.
    Wait,
    /// The job reached a terminal state; hand over to the finalizer.
    Complete(JobState),
}

/// Drives a `WorkflowContext` through the state machine.
pub struct StateMachine;

impl StateMachine {
    /// Compute and apply the transition for `event` in the context's current state.
    ///
    /// - `Start` only accepts `Submitted`, which records the job handle and
    ///   moves to `InProgress`.
    /// - `InProgress` only accepts `Polled`; a terminal result completes the
    ///   workflow, anything else keeps it waiting.
    /// - `Completed` and `Failed` accept no events.
    pub fn next(ctx: &mut WorkflowContext, event: Event) -> Result<Transition, TunerError> {
        let transition = match (ctx.status, event) {
            (JobState::Start, Event::Submitted(handle)) => {
                ctx.job_name = Some(handle.job_name);
                ctx.job_arn = Some(handle.job_arn);
                Transition::Next(JobState::InProgress)
            }
            (JobState::InProgress, Event::Polled(polled)) => match polled {
                JobState::Completed | JobState::Failed => Transition::Complete(polled),
                JobState::InProgress => Transition::Wait,
                JobState::Start => {
                    return Err(TunerError::InvalidTransition {
                        state: ctx.status,
                        event: Event::Polled(polled).to_string(),
                    });
                }
            },
            (state, event) => {
                return Err(TunerError::InvalidTransition {
                    state,
                    event: event.to_string(),
                });
            }
        };

        match transition {
            Transition::Next(state) | Transition::Complete(state) => ctx.status = state,
            Transition::Wait => {}
        }

        Ok(transition)
    }
}

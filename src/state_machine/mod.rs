mod job;
mod state;

pub use job::{
    CallbackToken, JobHandle, RetryConfig, TuningRequest, WorkflowContext, WorkflowRecord,
};
pub use state::{Event, JobState, StateMachine, Transition};

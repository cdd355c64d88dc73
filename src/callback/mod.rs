pub mod client;
pub mod error;

pub use client::{CallbackSender, HttpCallbackClient, OutputParameter};
pub use error::CallbackError;

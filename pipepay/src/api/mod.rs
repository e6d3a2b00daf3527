//! Pipeline, execution and file management over a [`Requester`](crate::request::Requester).

pub mod client;
pub mod types;

pub use client::Client;
pub use types::{
    ExecutionDetails, ExecutionStatus, ExecutionStep, FileObject, PipelineDetails, PipelineInit,
};

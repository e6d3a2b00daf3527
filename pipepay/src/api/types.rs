//! Resource types of the pipeline and file API.
//!
//! Timestamps are kept as the ISO-8601 strings the service sends.

use serde::{Deserialize, Serialize};
use serde_with::json::JsonString;
use serde_with::serde_as;
use std::collections::BTreeMap;
use std::fmt;

/// Status of a pipeline execution or one of its steps.
///
/// Unknown values are preserved in [`Other`](Self::Other).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    /// Created but never started.
    Draft,
    /// Waiting for payment or compute capacity.
    Pending,
    /// Canceled before it started.
    Canceled,
    /// Running.
    Executing,
    /// Finished with an error.
    Failed,
    /// Stopped on request.
    Stopped,
    /// Stop requested, still winding down.
    Stopping,
    /// Finished successfully.
    Succeeded,
    /// A status this client does not know.
    Other(String),
}

impl ExecutionStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "Draft",
            Self::Pending => "Pending",
            Self::Canceled => "Canceled",
            Self::Executing => "Executing",
            Self::Failed => "Failed",
            Self::Stopped => "Stopped",
            Self::Stopping => "Stopping",
            Self::Succeeded => "Succeeded",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` once the execution can no longer change.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Failed | Self::Stopped | Self::Succeeded
        )
    }
}

impl From<String> for ExecutionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Draft" => Self::Draft,
            "Pending" => Self::Pending,
            "Canceled" => Self::Canceled,
            "Executing" => Self::Executing,
            "Failed" => Self::Failed,
            "Stopped" => Self::Stopped,
            "Stopping" => Self::Stopping,
            "Succeeded" => Self::Succeeded,
            _ => Self::Other(value),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(value: ExecutionStatus) -> Self {
        match value {
            ExecutionStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Step name.
    pub name: String,
    /// Start time.
    #[serde(default)]
    pub start: Option<String>,
    /// End time.
    #[serde(default)]
    pub end: Option<String>,
    /// Step status.
    pub status: ExecutionStatus,
    /// Failure reason, if any.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDetails {
    /// Execution identifier.
    pub id: String,
    /// Current status.
    pub status: ExecutionStatus,
    /// Failure reason, if any.
    #[serde(default)]
    pub reason: Option<String>,
    /// Start time.
    #[serde(default)]
    pub start: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created: Option<String>,
}

/// A stored code or data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileObject {
    /// File name.
    pub name: String,
    /// Last modification time.
    #[serde(default)]
    pub mod_date: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<u64>,
    /// Whether the entry is a directory.
    #[serde(default)]
    pub is_dir: Option<bool>,
}

/// A pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDetails {
    /// Pipeline name.
    pub name: String,
    /// Creation time.
    #[serde(default)]
    pub creation_time: Option<String>,
    /// Last modification time.
    #[serde(default)]
    pub last_modified_time: Option<String>,
    /// Time of the most recent execution.
    #[serde(default)]
    pub last_execution_time: Option<String>,
}

/// Parameters of a new pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInit {
    /// Code file doing the preprocessing.
    pub processing_file: String,
    /// Code file doing the evaluation.
    pub evaluation_file: String,
    /// ML framework name.
    pub framework: String,
    /// Algorithm name.
    pub algorithm: String,
    /// Algorithm hyperparameters.
    pub hyper_parameters: BTreeMap<String, String>,
}

/// Wire body of `POST pipeline`; hyperparameters travel as a JSON string.
#[serde_as]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePipeline<'a> {
    pub pipeline_name: &'a str,
    pub processing_file: &'a str,
    pub evaluation_file: &'a str,
    pub framework: &'a str,
    pub algorithm: &'a str,
    #[serde_as(as = "JsonString")]
    pub hyper_parameters: &'a BTreeMap<String, String>,
}

impl<'a> CreatePipeline<'a> {
    pub(crate) fn new(pipeline_name: &'a str, init: &'a PipelineInit) -> Self {
        Self {
            pipeline_name,
            processing_file: &init.processing_file,
            evaluation_file: &init.evaluation_file,
            framework: &init.framework,
            algorithm: &init.algorithm,
            hyper_parameters: &init.hyper_parameters,
        }
    }
}

/// Wire body addressing one execution of a pipeline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecutionRef<'a> {
    pub pipeline_name: &'a str,
    pub execution_id: &'a str,
}

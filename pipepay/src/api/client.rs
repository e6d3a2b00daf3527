//! Typed access to the pipeline and file endpoints.

use serde::de::IgnoredAny;
use serde_json::Value;

use crate::api::types::{
    CreatePipeline, ExecutionDetails, ExecutionRef, ExecutionStep, FileObject, PipelineDetails,
    PipelineInit,
};
use crate::chain::PurchaseChain;
use crate::config::PurchaseConfig;
use crate::error::{PurchaseError, RequestError};
use crate::purchase::{PurchaseFlow, PurchaseReceipt, RouteOracle};
use crate::request::Requester;

const CODE_FILE: &str = "file/code";
const CODE_FILE_DOWNLOAD: &str = "file/code/download";
const DATA_FILE: &str = "file/data";
const PIPELINE: &str = "pipeline";
const PIPELINE_LIST: &str = "pipeline/list";
const PIPELINE_EXECUTIONS: &str = "pipeline/execution/list";
const EXECUTION: &str = "pipeline/execution";
const EXECUTION_STEPS: &str = "pipeline/steps";
const EXECUTION_STOP: &str = "pipeline/stop";
const EXECUTION_RETRY: &str = "pipeline/retry";
const EXECUTION_MODEL: &str = "pipeline/model";
const EXECUTION_LOG: &str = "pipeline/log";

/// Client for the remote job service.
///
/// Every call goes through the [`Requester`]; paid starts additionally run a
/// [`PurchaseFlow`].
#[derive(Debug, Clone)]
pub struct Client<R> {
    requester: R,
}

impl<R: Requester> Client<R> {
    /// Creates a client over `requester`.
    pub const fn new(requester: R) -> Self {
        Self { requester }
    }

    /// Returns the underlying requester.
    pub const fn requester(&self) -> &R {
        &self.requester
    }

    /// Lists the uploaded code files.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn code_files(&self) -> Result<Vec<FileObject>, RequestError> {
        self.requester.get(CODE_FILE, &[]).await
    }

    /// Uploads a code file under `file_name`.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn upload_code_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Value, RequestError> {
        self.requester
            .upload_file(CODE_FILE, contents, file_name)
            .await
    }

    /// Deletes a code file.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn delete_code_file(&self, file_name: &str) -> Result<(), RequestError> {
        let _: IgnoredAny = self
            .requester
            .delete(CODE_FILE, &[("fileName", file_name)])
            .await?;
        Ok(())
    }

    /// Downloads a code file.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn download_code_file(&self, file_name: &str) -> Result<Vec<u8>, RequestError> {
        self.requester
            .download(CODE_FILE_DOWNLOAD, &[("fileName", file_name)])
            .await
    }

    /// Lists the available data files.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn data_files(&self) -> Result<Vec<FileObject>, RequestError> {
        self.requester.get(DATA_FILE, &[]).await
    }

    /// Lists all pipelines.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn pipelines(&self) -> Result<Vec<PipelineDetails>, RequestError> {
        self.requester.get(PIPELINE_LIST, &[]).await
    }

    /// Fetches one pipeline.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn pipeline(&self, name: &str) -> Result<PipelineDetails, RequestError> {
        self.requester
            .get(PIPELINE, &[("pipelineName", name)])
            .await
    }

    /// Creates a pipeline.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn create_pipeline(&self, name: &str, init: &PipelineInit) -> Result<(), RequestError> {
        let _: IgnoredAny = self
            .requester
            .post(PIPELINE, &CreatePipeline::new(name, init))
            .await?;
        Ok(())
    }

    /// Deletes a pipeline.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn delete_pipeline(&self, name: &str) -> Result<(), RequestError> {
        let _: IgnoredAny = self
            .requester
            .delete(PIPELINE, &[("pipelineName", name)])
            .await?;
        Ok(())
    }

    /// Lists the executions of a pipeline.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn executions(&self, name: &str) -> Result<Vec<ExecutionDetails>, RequestError> {
        self.requester
            .get(PIPELINE_EXECUTIONS, &[("pipelineName", name)])
            .await
    }

    /// Fetches one execution.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn execution(&self, name: &str, execution_id: &str) -> Result<ExecutionDetails, RequestError> {
        self.requester
            .get(
                EXECUTION,
                &[("pipelineName", name), ("executionId", execution_id)],
            )
            .await
    }

    /// Fetches the steps of an execution.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn execution_steps(
        &self,
        name: &str,
        execution_id: &str,
    ) -> Result<Vec<ExecutionStep>, RequestError> {
        self.requester
            .get(
                EXECUTION_STEPS,
                &[("executionId", execution_id), ("pipelineName", name)],
            )
            .await
    }

    /// Asks the service to stop an execution.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn stop_execution(&self, name: &str, execution_id: &str) -> Result<(), RequestError> {
        self.post_execution(EXECUTION_STOP, name, execution_id).await
    }

    /// Asks the service to retry a failed execution.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn retry_execution(&self, name: &str, execution_id: &str) -> Result<(), RequestError> {
        self.post_execution(EXECUTION_RETRY, name, execution_id).await
    }

    /// Deletes an execution record.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn delete_execution(&self, name: &str, execution_id: &str) -> Result<(), RequestError> {
        let _: IgnoredAny = self
            .requester
            .delete(
                EXECUTION,
                &[("pipelineName", name), ("executionId", execution_id)],
            )
            .await?;
        Ok(())
    }

    /// Downloads the trained model of an execution.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn download_model(&self, name: &str, execution_id: &str) -> Result<Vec<u8>, RequestError> {
        self.requester
            .download(
                EXECUTION_MODEL,
                &[("pipelineName", name), ("executionId", execution_id)],
            )
            .await
    }

    /// Downloads the log of an execution.
    ///
    /// # Errors
    ///
    /// Propagates [`RequestError`] from the requester.
    pub async fn download_log(&self, name: &str, execution_id: &str) -> Result<Vec<u8>, RequestError> {
        self.requester
            .download(
                EXECUTION_LOG,
                &[("pipelineName", name), ("executionId", execution_id)],
            )
            .await
    }

    /// Starts a paid execution of pipeline `name` on `input_data_file`.
    ///
    /// # Errors
    ///
    /// Returns the [`PurchaseError`] of the first failing purchase step.
    pub async fn start<C: PurchaseChain, O: RouteOracle>(
        &self,
        flow: &PurchaseFlow<C, O>,
        name: &str,
        input_data_file: &str,
        config: &PurchaseConfig,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        flow.start(&self.requester, name, input_data_file, config)
            .await
    }

    async fn post_execution(&self, path: &str, name: &str, execution_id: &str) -> Result<(), RequestError> {
        let _: IgnoredAny = self
            .requester
            .post(
                path,
                &ExecutionRef {
                    pipeline_name: name,
                    execution_id,
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ExecutionStatus;
    use crate::purchase::testing::{FakeChain, FakeRequester};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn client(requester: &FakeRequester) -> Client<FakeRequester> {
        Client::new(requester.clone())
    }

    #[tokio::test]
    async fn executions_are_listed_by_pipeline_name() {
        let requester = FakeRequester::new(FakeChain::new().journal()).respond(
            "GET",
            PIPELINE_EXECUTIONS,
            json!([{"id": "e1", "status": "Executing"}, {"id": "e2", "status": "Succeeded"}]),
        );

        let executions = client(&requester).executions("churn").await.unwrap();

        assert_eq!(executions.len(), 2);
        assert_eq!(executions[0].status, ExecutionStatus::Executing);
        let call = &requester.calls()[0];
        assert_eq!(call.method, "GET");
        assert_eq!(call.params, vec![("pipelineName".into(), "churn".into())]);
    }

    #[tokio::test]
    async fn stop_posts_pipeline_and_execution() {
        let requester = FakeRequester::default();

        client(&requester).stop_execution("churn", "e1").await.unwrap();

        let call = &requester.calls()[0];
        assert_eq!(call.method, "POST");
        assert_eq!(call.path, EXECUTION_STOP);
        assert_eq!(
            call.body,
            Some(json!({"pipelineName": "churn", "executionId": "e1"}))
        );
    }

    #[tokio::test]
    async fn create_pipeline_sends_stringified_hyper_parameters() {
        let requester = FakeRequester::default();
        let init = PipelineInit {
            hyper_parameters: BTreeMap::from([("lr".to_owned(), "0.1".to_owned())]),
            ..PipelineInit::default()
        };

        client(&requester).create_pipeline("churn", &init).await.unwrap();

        let body = requester.calls()[0].body.clone().unwrap();
        assert_eq!(body["hyperParameters"], json!("{\"lr\":\"0.1\"}"));
        assert_eq!(body["pipelineName"], json!("churn"));
    }

    #[tokio::test]
    async fn code_file_round_trip_uses_file_endpoints() {
        let requester = FakeRequester::default()
            .respond("UPLOAD", CODE_FILE, json!({"uploaded": true}))
            .respond("DOWNLOAD", CODE_FILE_DOWNLOAD, json!("print('hi')"));
        let client = client(&requester);

        let uploaded = client
            .upload_code_file("train.py", b"print('hi')".to_vec())
            .await
            .unwrap();
        let contents = client.download_code_file("train.py").await.unwrap();
        client.delete_code_file("train.py").await.unwrap();

        assert_eq!(uploaded, json!({"uploaded": true}));
        assert_eq!(contents, b"print('hi')");
        let calls = requester.calls();
        assert_eq!(calls[1].params, vec![("fileName".into(), "train.py".into())]);
        assert_eq!(calls[2].method, "DELETE");
        assert_eq!(calls[2].path, CODE_FILE);
    }

    #[tokio::test]
    async fn decode_failure_names_endpoint() {
        let requester =
            FakeRequester::default().respond("GET", PIPELINE_LIST, json!({"not": "a list"}));

        let err = client(&requester).pipelines().await.unwrap_err();

        assert!(matches!(err, RequestError::Decode { ref context, .. } if context == PIPELINE_LIST));
    }
}

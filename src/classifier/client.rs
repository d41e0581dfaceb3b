use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;

use super::payload::{PAYLOAD_FILE_NAME, PAYLOAD_MIME};
use super::{parse_predict_body, ClassificationResult, ClassifyError, FacePayload};

/// Remote emotion classification capability.
pub trait Classifier: Send + Sync + 'static {
    fn classify(
        &self,
        payload: FacePayload,
    ) -> impl Future<Output = Result<ClassificationResult, ClassifyError>> + Send;
}

/// Posts face crops to an HTTP `/predict` endpoint as multipart form data.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: Url,
    upload_field: String,
}

impl HttpClassifier {
    pub fn new(endpoint: &str, upload_field: &str, request_timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid classifier endpoint {endpoint:?}"))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build classifier HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            upload_field: upload_field.to_string(),
        })
    }

    async fn post(&self, payload: FacePayload) -> Result<ClassificationResult, ClassifyError> {
        let part = Part::bytes(payload.bytes)
            .file_name(PAYLOAD_FILE_NAME)
            .mime_str(PAYLOAD_MIME)?;
        let form = Form::new().part(self.upload_field.clone(), part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_predict_body(&body)
    }
}

impl Classifier for HttpClassifier {
    fn classify(
        &self,
        payload: FacePayload,
    ) -> impl Future<Output = Result<ClassificationResult, ClassifyError>> + Send {
        self.post(payload)
    }
}

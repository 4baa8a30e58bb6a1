//! Metadata Extraction Service client
//!
//! Uploads one image per request as a single-field multipart body and
//! normalizes every possible outcome (transport error, HTTP error status,
//! `success: false` body, payload-less success) into an `ExtractionResult`.
//! Nothing raised here escapes to the batch processor.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use crate::config::ImporterConfig;
use crate::error::ImportError;
use crate::models::{ExtractionResponse, ExtractionResult, ImageFile};

const USER_AGENT: &str = concat!("wfimport/", env!("CARGO_PKG_VERSION"));

/// Extraction seam used by the batch processor
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extract embedded workflow metadata from one file
    async fn extract(&self, file: &ImageFile) -> ExtractionResult;
}

/// HTTP client for the Metadata Extraction Service
pub struct ExtractionClient {
    http_client: reqwest::Client,
    endpoint: String,
    upload_field: String,
}

/// Join the service base URL and the endpoint path with exactly one `/`
pub fn endpoint_url(service_url: &str, extract_path: &str) -> String {
    format!(
        "{}/{}",
        service_url.trim_end_matches('/'),
        extract_path.trim_start_matches('/')
    )
}

fn network_error(detail: impl std::fmt::Display) -> ImportError {
    ImportError::Network(format!("Extraction failed: {}", detail))
}

impl ExtractionClient {
    /// Create new extraction client
    ///
    /// `timeout` of `None` keeps the transport default.
    pub fn new(
        service_url: &str,
        extract_path: &str,
        upload_field: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ImportError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(network_error)?;

        Ok(Self {
            http_client,
            endpoint: endpoint_url(service_url, extract_path),
            upload_field: upload_field.to_string(),
        })
    }

    pub fn from_config(config: &ImporterConfig) -> Result<Self, ImportError> {
        Self::new(
            &config.service_url,
            &config.extract_path,
            &config.upload_field,
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_part(file: &ImageFile) -> Part {
        let part = Part::bytes(file.data.clone()).file_name(file.name.clone());
        match part.mime_str(&file.mime_type) {
            Ok(part) => part,
            Err(e) => {
                tracing::debug!(file = %file.name, mime = %file.mime_type, error = %e, "Unparseable MIME type, uploading without it");
                Part::bytes(file.data.clone()).file_name(file.name.clone())
            }
        }
    }
}

#[async_trait]
impl MetadataExtractor for ExtractionClient {
    async fn extract(&self, file: &ImageFile) -> ExtractionResult {
        let form = Form::new().part(self.upload_field.clone(), Self::build_part(file));

        tracing::debug!(file = %file.name, bytes = file.data.len(), url = %self.endpoint, "Requesting metadata extraction");

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(file = %file.name, status = status.as_u16(), "Extraction service returned error status");
            return Err(network_error(status.as_u16()));
        }

        let body: ExtractionResponse = response.json().await.map_err(network_error)?;
        let result = body.into_result();

        match &result {
            Ok(success) => tracing::info!(
                file = %file.name,
                has_workflow = success.workflow_graph.is_some(),
                has_prompt = success.api_prompt.is_some(),
                "Metadata extraction successful"
            ),
            Err(e) => tracing::info!(file = %file.name, reason = %e, "No usable metadata in image"),
        }

        result
    }
}

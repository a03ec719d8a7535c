//! HTTP client for the contract analysis backend.

use std::time::Duration;

use async_trait::async_trait;
use contractscan_core::Upload;
use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::{Analysis, AnalyzeError, AnalyzeResponse, ContractAnalyzer};

const ANALYZE_PATH: &str = "/api/contracts/analyze";

/// Multipart field the backend reads the document from.
const PDF_FIELD: &str = "pdf";

/// Posts uploaded contracts to the backend's analyze endpoint.
pub struct AnalyzeClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalyzeClient {
    /// Create a client for the given backend base URL.
    ///
    /// `base_url` should be like `http://localhost:3000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Like [`new`](Self::new) with a whole-request timeout.
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self, AnalyzeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContractAnalyzer for AnalyzeClient {
    async fn analyze(&self, upload: &Upload) -> Result<Analysis, AnalyzeError> {
        let url = format!("{}{}", self.base_url, ANALYZE_PATH);
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.display_name().to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part(PDF_FIELD, part);

        info!(
            url = %url,
            file = upload.display_name(),
            bytes = upload.bytes.len(),
            "submitting contract for analysis"
        );
        let resp = self.client.post(&url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyzeError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let response: AnalyzeResponse = serde_json::from_str(&body)?;
        let analysis = response.into_analysis()?;
        info!(
            effective_date = ?analysis.effective_date,
            "contract analysis complete"
        );
        Ok(analysis)
    }
}

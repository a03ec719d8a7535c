//! Contract analysis seam: the one real external call a scan makes.
//!
//! The orchestrator only sees [`ContractAnalyzer`]. The `http` feature adds
//! [`AnalyzeClient`], which posts the PDF to the analysis backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use contractscan_core::Upload;
use thiserror::Error;

mod response;
pub use response::AnalyzeResponse;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::AnalyzeClient;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed effective date {value:?}")]
    MalformedDate { value: String },
}

/// Result of analysing one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Opaque payload echoed back to the caller on completion.
    pub structured_data: serde_json::Value,
    /// Effective date found in the contract, if any.
    pub effective_date: Option<NaiveDate>,
}

/// Analyses an uploaded contract. Called exactly once per scan.
#[async_trait]
pub trait ContractAnalyzer: Send + Sync {
    async fn analyze(&self, upload: &Upload) -> Result<Analysis, AnalyzeError>;
}

#[async_trait]
impl<T: ContractAnalyzer + ?Sized> ContractAnalyzer for Arc<T> {
    async fn analyze(&self, upload: &Upload) -> Result<Analysis, AnalyzeError> {
        (**self).analyze(upload).await
    }
}

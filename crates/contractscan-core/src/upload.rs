//! The uploaded contract document.

/// Magic bytes every PDF file starts with.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Name shown when the upload carries no file name.
const FALLBACK_NAME: &str = "Sales Contract";

/// A contract file supplied by the user.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the bytes start with the PDF signature.
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(PDF_SIGNATURE)
    }

    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(FALLBACK_NAME)
    }

    /// Size in megabytes with two decimals, e.g. `"2.31 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.bytes.len() as f64 / (1024.0 * 1024.0))
    }
}

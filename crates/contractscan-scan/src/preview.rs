//! Local preview copy of the uploaded document.
//!
//! The copy lives in a temporary file for as long as the scan (or the
//! caller holding the [`Completion`](crate::Completion)) owns the handle.
//! It is removed exactly once: by [`PreviewHandle::release`] or on drop.

use std::io::Write;
use std::path::{Path, PathBuf};

use contractscan_core::Upload;
use tempfile::TempPath;
use tracing::{debug, info, warn};
use url::Url;

use crate::ScanError;

#[derive(Debug)]
pub struct PreviewHandle {
    path: Option<TempPath>,
    url: String,
}

impl PreviewHandle {
    /// Write the upload to a fresh temporary file in `dir` (or the system
    /// temp directory).
    pub fn create(upload: &Upload, dir: Option<&Path>) -> Result<Self, ScanError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("contractscan-").suffix(".pdf");
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&upload.bytes)?;
        file.flush()?;

        let path = file.into_temp_path();
        let url = file_url(&path)?;
        debug!(url = %url, bytes = upload.bytes.len(), "preview created");
        Ok(Self {
            path: Some(path),
            url,
        })
    }

    /// `file://` URL of the preview. Stays the same after release.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.path.is_none()
    }

    /// Delete the preview file. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        let Some(path) = self.path.take() else {
            return false;
        };
        if let Err(e) = path.close() {
            warn!(url = %self.url, error = %e, "failed to remove preview file");
        }
        info!(url = %self.url, "preview released");
        true
    }

    /// Keep the preview at `dest` instead of deleting it.
    pub fn persist(mut self, dest: &Path) -> Result<PathBuf, ScanError> {
        let path = self.path.take().ok_or(ScanError::PreviewReleased)?;
        path.persist(dest)?;
        info!(dest = %dest.display(), "preview persisted");
        Ok(dest.to_path_buf())
    }
}

/// Percent-encoded `file://` URL for `path`, resolved to an absolute path.
pub fn file_url(path: &Path) -> Result<String, ScanError> {
    let absolute = std::fs::canonicalize(path)?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| ScanError::FileUrl(absolute))
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}

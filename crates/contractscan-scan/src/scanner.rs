//! The scan orchestrator.
//!
//! [`Scanner::start`] runs upload → extract → analyze → effective-date and
//! returns an [`ActiveScan`] parked at the confirmation gate (or halted on
//! a failed step). [`ActiveScan::confirm_effective_date`] runs `generate`
//! and yields the [`Completion`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use contractscan_analyze::{AnalyzeError, ContractAnalyzer};
use contractscan_core::{ScanSession, ScanSnapshot, SessionError, StepId, StepStatus, Upload};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{Pacing, PreviewHandle, ScanError, ScanObserver};

/// Why a step failed. Recorded on the session, never returned to callers.
#[derive(Debug, Error)]
enum StepFailure {
    #[error("{name} is not a PDF document")]
    NotPdf { name: String },
    #[error("contract analysis failed: {0}")]
    Analyze(#[from] AnalyzeError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Drives scan sessions against one analysis backend.
pub struct Scanner<A> {
    analyzer: A,
    pacing: Pacing,
    preview_dir: Option<PathBuf>,
    observers: Vec<Arc<dyn ScanObserver>>,
}

impl<A: ContractAnalyzer> Scanner<A> {
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            pacing: Pacing::default(),
            preview_dir: None,
            observers: Vec::new(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Directory for preview files; defaults to the system temp directory.
    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = Some(dir.into());
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Open a session for `upload` and run it up to the confirmation gate.
    ///
    /// Only a missing file or a failure to create the preview is an `Err`.
    /// Step failures halt the returned session instead; inspect
    /// [`ActiveScan::session`].
    pub async fn start(&self, upload: Upload) -> Result<ActiveScan<'_, A>, ScanError> {
        if upload.is_empty() {
            return Err(ScanError::EmptyUpload);
        }
        let preview = PreviewHandle::create(&upload, self.preview_dir.as_deref())?;
        info!(
            file = upload.display_name(),
            size = %upload.size_label(),
            "scan started"
        );

        let mut scan = ActiveScan {
            scanner: self,
            session: ScanSession::new(),
            upload,
            preview: Some(preview),
        };
        scan.notify();

        if let Err(err) = scan.run_to_gate().await {
            let step = scan.session.fail(err.to_string())?;
            warn!(step = %step, error = %err, "scan halted");
            scan.notify();
        }
        Ok(scan)
    }
}

/// A session opened by [`Scanner::start`].
///
/// Dropping it, or calling [`close`](Self::close), releases the preview
/// unless it has been handed over in a [`Completion`].
pub struct ActiveScan<'a, A> {
    scanner: &'a Scanner<A>,
    session: ScanSession,
    upload: Upload,
    preview: Option<PreviewHandle>,
}

impl<A: ContractAnalyzer> ActiveScan<'_, A> {
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.session.snapshot()
    }

    pub fn upload(&self) -> &Upload {
        &self.upload
    }

    /// The preview, until it is handed over or released.
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// Replace the effective date from raw `YYYY-MM-DD` input (empty clears).
    pub fn set_effective_date(&mut self, value: &str) -> Result<(), ScanError> {
        self.session.set_effective_date(value)?;
        debug!(
            effective_date = ?self.session.gate().effective_date(),
            modified = self.session.gate().is_modified(),
            "effective date changed"
        );
        self.notify();
        Ok(())
    }

    /// Confirm the effective date, run `generate`, and hand over the result.
    ///
    /// `Ok(None)` when there is nothing to confirm (empty date) or a
    /// confirmation is already being processed.
    pub async fn confirm_effective_date(&mut self) -> Result<Option<Completion>, ScanError> {
        let Some(effective_date) = self.session.confirm_effective_date()? else {
            debug!("confirmation ignored");
            return Ok(None);
        };
        info!(
            effective_date = %effective_date,
            modified = self.session.gate().is_modified(),
            "effective date confirmed"
        );
        self.notify();

        self.pace(StepId::Generate).await;
        self.session.advance(StepId::Generate, StepStatus::Completed)?;
        self.notify();
        sleep(self.scanner.pacing.settle()).await;

        let preview = self.preview.take().ok_or(ScanError::PreviewReleased)?;
        let extracted_data = self
            .session
            .take_extracted_data()
            .unwrap_or(serde_json::Value::Null);
        info!(url = %preview.url(), "scan complete");
        Ok(Some(Completion {
            extracted_data,
            effective_date,
            preview,
        }))
    }

    /// End the session at whatever step it is on. Returns whether a preview
    /// was released.
    pub fn close(mut self) -> bool {
        let released = self
            .preview
            .as_mut()
            .map(PreviewHandle::release)
            .unwrap_or(false);
        info!(step = %self.session.current_step(), released, "scan closed");
        released
    }

    async fn run_to_gate(&mut self) -> Result<(), StepFailure> {
        self.session.advance(StepId::Upload, StepStatus::Processing)?;
        self.notify();
        self.pace(StepId::Upload).await;
        if !self.upload.looks_like_pdf() {
            return Err(StepFailure::NotPdf {
                name: self.upload.display_name().to_string(),
            });
        }
        self.complete(StepId::Upload)?;

        for step in [StepId::Extract, StepId::Analyze] {
            self.pace(step).await;
            self.complete(step)?;
        }

        let analysis = self.scanner.analyzer.analyze(&self.upload).await?;
        info!(
            detected = ?analysis.effective_date,
            "effective date detection finished"
        );
        self.session
            .record_detection(analysis.effective_date, analysis.structured_data)?;
        self.complete(StepId::EffectiveDate)?;
        Ok(())
    }

    fn complete(&mut self, step: StepId) -> Result<(), SessionError> {
        self.session.advance(step, StepStatus::Completed)?;
        debug!(step = %step, "step completed");
        self.notify();
        Ok(())
    }

    async fn pace(&self, step: StepId) {
        sleep(self.scanner.pacing.step_delay(step)).await;
    }

    fn notify(&self) {
        if self.scanner.observers.is_empty() {
            return;
        }
        let snapshot = self.session.snapshot();
        for observer in &self.scanner.observers {
            observer.on_update(&snapshot);
        }
    }
}

async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Result of a confirmed scan.
///
/// Owns the preview: it is released when the completion is dropped, unless
/// persisted first.
#[derive(Debug)]
pub struct Completion {
    pub extracted_data: serde_json::Value,
    pub effective_date: NaiveDate,
    pub preview: PreviewHandle,
}

impl Completion {
    pub fn contract_url(&self) -> &str {
        self.preview.url()
    }

    /// Keep the preview file at `dest` instead of releasing it.
    pub fn persist_preview(self, dest: &Path) -> Result<PathBuf, ScanError> {
        self.preview.persist(dest)
    }

    /// The caller-facing payload: the extracted object's fields plus
    /// `effectiveDate` and `contractUrl`.
    ///
    /// Non-object payloads are kept under `structuredData`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut payload = match &self.extracted_data {
            serde_json::Value::Object(map) => map.clone(),
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("structuredData".into(), other.clone());
                map
            }
        };
        payload.insert(
            "effectiveDate".into(),
            serde_json::Value::String(self.effective_date.to_string()),
        );
        payload.insert(
            "contractUrl".into(),
            serde_json::Value::String(self.contract_url().to_string()),
        );
        serde_json::Value::Object(payload)
    }
}

impl Serialize for Completion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

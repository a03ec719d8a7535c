//! Scan step vocabulary shared by the session model, the orchestrator and
//! the progress renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one step in the scan sequence.
///
/// The set and order are fixed for every session; see [`STEP_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Upload,
    Extract,
    Analyze,
    EffectiveDate,
    ConfirmDate,
    Generate,
}

/// The fixed step order: upload → extract → analyze → effective-date →
/// confirm-date → generate.
pub const STEP_ORDER: [StepId; 6] = [
    StepId::Upload,
    StepId::Extract,
    StepId::Analyze,
    StepId::EffectiveDate,
    StepId::ConfirmDate,
    StepId::Generate,
];

impl StepId {
    /// Stable identifier, unique within the sequence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Extract => "extract",
            Self::Analyze => "analyze",
            Self::EffectiveDate => "effective-date",
            Self::ConfirmDate => "confirm-date",
            Self::Generate => "generate",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Upload => "Document Upload",
            Self::Extract => "Text Extraction",
            Self::Analyze => "Contract Analysis",
            Self::EffectiveDate => "Effective Date Detection",
            Self::ConfirmDate => "Date Confirmation",
            Self::Generate => "Timeline Generation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Upload => "Uploading and validating PDF document",
            Self::Extract => "Extracting text content from PDF",
            Self::Analyze => "Analyzing contract terms and identifying key information",
            Self::EffectiveDate => "Identifying contract effective date",
            Self::ConfirmDate => "Confirming effective date with user",
            Self::Generate => "Creating tasks and deadlines based on contract terms",
        }
    }

    /// Position of this step in [`STEP_ORDER`].
    pub fn index(&self) -> usize {
        match self {
            Self::Upload => 0,
            Self::Extract => 1,
            Self::Analyze => 2,
            Self::EffectiveDate => 3,
            Self::ConfirmDate => 4,
            Self::Generate => 5,
        }
    }

    /// The step that follows this one, or `None` for the last step.
    pub fn next(&self) -> Option<StepId> {
        STEP_ORDER.get(self.index() + 1).copied()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a scan session together with its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStep {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
}

impl ScanStep {
    /// A fresh `pending` step with the display text for `id`.
    pub fn pending(id: StepId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            description: id.description().to_string(),
            status: StepStatus::Pending,
        }
    }
}

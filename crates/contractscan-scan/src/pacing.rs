//! Per-step delays for the steps that do no external work.

use std::time::Duration;

use contractscan_core::StepId;
use serde::{Deserialize, Serialize};

/// Delays applied while a step is `processing`, in milliseconds.
///
/// `effective-date` waits on the analysis backend and `confirm-date` on the
/// user, so neither has an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    pub upload_ms: u64,
    pub extract_ms: u64,
    pub analyze_ms: u64,
    pub generate_ms: u64,
    /// Pause between the last step completing and the completion hand-off.
    pub settle_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            upload_ms: 1000,
            extract_ms: 1500,
            analyze_ms: 2000,
            generate_ms: 2000,
            settle_ms: 1000,
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn immediate() -> Self {
        Self {
            upload_ms: 0,
            extract_ms: 0,
            analyze_ms: 0,
            generate_ms: 0,
            settle_ms: 0,
        }
    }

    pub fn step_delay(&self, step: StepId) -> Duration {
        let ms = match step {
            StepId::Upload => self.upload_ms,
            StepId::Extract => self.extract_ms,
            StepId::Analyze => self.analyze_ms,
            StepId::Generate => self.generate_ms,
            StepId::EffectiveDate | StepId::ConfirmDate => 0,
        };
        Duration::from_millis(ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

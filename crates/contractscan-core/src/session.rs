//! Scan session state machine.
//!
//! A [`ScanSession`] owns the ordered step list, the current-step pointer,
//! the date gate and the extracted payload. It enforces:
//!
//! - steps before the pointer are `completed`, steps after it `pending`
//! - at most one step is `processing`
//! - the pointer never passes `confirm-date` without a confirmation
//! - after an `error` nothing else moves
//! - once every step is `completed` nothing moves either

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::gate::DateGate;
use crate::step::{STEP_ORDER, ScanStep, StepId, StepStatus};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session halted after step {step} failed")]
    Halted { step: StepId },

    #[error("session already completed")]
    Completed,

    #[error("step {got} is not the active step ({expected})")]
    OutOfOrder { expected: StepId, got: StepId },

    #[error("cannot move step {step} from {from} to {to}")]
    InvalidTransition {
        step: StepId,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("effective date can only be changed at the confirmation step")]
    GateClosed,

    #[error("invalid date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub step: StepId,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ScanSession {
    steps: Vec<ScanStep>,
    current: usize,
    gate: DateGate,
    extracted: Option<serde_json::Value>,
    failure: Option<Failure>,
}

/// Read-only view of a session handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub steps: Vec<ScanStep>,
    pub current_index: usize,
    pub detected_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub is_modified: bool,
    pub awaiting_confirmation: bool,
    pub generating: bool,
    pub failure: Option<Failure>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    /// A session with every step `pending` and the pointer on `upload`.
    pub fn new() -> Self {
        Self {
            steps: STEP_ORDER.iter().map(|id| ScanStep::pending(*id)).collect(),
            current: 0,
            gate: DateGate::default(),
            extracted: None,
            failure: None,
        }
    }

    pub fn steps(&self) -> &[ScanStep] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> StepId {
        STEP_ORDER[self.current]
    }

    pub fn status(&self, id: StepId) -> StepStatus {
        self.steps[id.index()].status
    }

    pub fn gate(&self) -> &DateGate {
        &self.gate
    }

    pub fn extracted_data(&self) -> Option<&serde_json::Value> {
        self.extracted.as_ref()
    }

    pub fn take_extracted_data(&mut self) -> Option<serde_json::Value> {
        self.extracted.take()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.failure.is_some()
    }

    /// True while progression waits on the user at `confirm-date`.
    pub fn awaiting_confirmation(&self) -> bool {
        !self.is_halted()
            && self.current_step() == StepId::ConfirmDate
            && !self.gate.is_in_flight()
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    /// Set the status of the active step.
    ///
    /// `completed` moves the pointer to the next step and marks it
    /// `processing`, except on `confirm-date`, which only moves through
    /// [`confirm_effective_date`](Self::confirm_effective_date). `error`
    /// halts the session.
    pub fn advance(&mut self, id: StepId, status: StepStatus) -> Result<(), SessionError> {
        if status == StepStatus::Error {
            self.check_active(id)?;
            self.halt(format!("{} failed", id.title()));
            return Ok(());
        }

        self.transition(id, status)?;
        if status == StepStatus::Completed && id != StepId::ConfirmDate {
            self.move_past(id);
        }
        Ok(())
    }

    /// Mark the active step `error` with a reason. Returns the failed step.
    ///
    /// Calling this on an already halted session keeps the first failure.
    /// A completed session cannot fail.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<StepId, SessionError> {
        if let Some(failure) = &self.failure {
            return Ok(failure.step);
        }
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        Ok(self.halt(reason.into()))
    }

    /// Store the analysis result and seed the gate with the detected date.
    pub fn record_detection(
        &mut self,
        detected: Option<NaiveDate>,
        extracted: serde_json::Value,
    ) -> Result<(), SessionError> {
        self.check_active(StepId::EffectiveDate)?;
        self.gate = DateGate::seeded(detected);
        self.extracted = Some(extracted);
        Ok(())
    }

    /// Replace the effective date from raw input. Only valid at the gate.
    pub fn set_effective_date(&mut self, value: &str) -> Result<(), SessionError> {
        self.check_not_halted()?;
        if !self.awaiting_confirmation() {
            return Err(SessionError::GateClosed);
        }
        self.gate.on_date_change(value)
    }

    /// Confirm the effective date and move on to `generate`.
    ///
    /// Returns `Ok(None)` without touching any state when there is no date
    /// to confirm or generation is already under way.
    pub fn confirm_effective_date(&mut self) -> Result<Option<NaiveDate>, SessionError> {
        self.check_not_halted()?;
        if self.gate.is_in_flight() {
            return Ok(None);
        }
        if self.current_step() != StepId::ConfirmDate {
            return Err(SessionError::GateClosed);
        }
        let Some(date) = self.gate.on_confirm() else {
            return Ok(None);
        };

        if self.status(StepId::ConfirmDate) != StepStatus::Completed {
            self.transition(StepId::ConfirmDate, StepStatus::Completed)?;
        }
        self.move_past(StepId::ConfirmDate);
        Ok(Some(date))
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            steps: self.steps.clone(),
            current_index: self.current,
            detected_date: self.gate.detected_date(),
            effective_date: self.gate.effective_date(),
            is_modified: self.gate.is_modified(),
            awaiting_confirmation: self.awaiting_confirmation(),
            generating: self.gate.is_in_flight() && !self.is_complete() && !self.is_halted(),
            failure: self.failure.clone(),
        }
    }

    fn check_not_halted(&self) -> Result<(), SessionError> {
        match &self.failure {
            Some(f) => Err(SessionError::Halted { step: f.step }),
            None => Ok(()),
        }
    }

    fn check_active(&self, id: StepId) -> Result<(), SessionError> {
        self.check_not_halted()?;
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let expected = self.current_step();
        if id != expected {
            return Err(SessionError::OutOfOrder { expected, got: id });
        }
        Ok(())
    }

    fn transition(&mut self, id: StepId, to: StepStatus) -> Result<(), SessionError> {
        self.check_active(id)?;
        let step = &mut self.steps[id.index()];
        let allowed = matches!(
            (step.status, to),
            (StepStatus::Pending, StepStatus::Processing)
                | (StepStatus::Pending, StepStatus::Completed)
                | (StepStatus::Processing, StepStatus::Completed)
        );
        if !allowed {
            return Err(SessionError::InvalidTransition {
                step: id,
                from: step.status,
                to,
            });
        }
        debug!(step = %id, from = %step.status, to = %to, "step transition");
        step.status = to;
        Ok(())
    }

    fn move_past(&mut self, id: StepId) {
        if let Some(next) = id.next() {
            self.current = next.index();
            self.steps[self.current].status = StepStatus::Processing;
            debug!(step = %next, "step started");
        }
    }

    fn halt(&mut self, reason: String) -> StepId {
        let step = self.current_step();
        self.steps[self.current].status = StepStatus::Error;
        debug!(step = %step, reason = %reason, "session halted");
        self.failure = Some(Failure { step, reason });
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Drive a session up to the confirmation gate.
    fn at_gate(detected: Option<NaiveDate>) -> ScanSession {
        let mut s = ScanSession::new();
        s.advance(StepId::Upload, StepStatus::Processing).unwrap();
        s.advance(StepId::Upload, StepStatus::Completed).unwrap();
        s.advance(StepId::Extract, StepStatus::Completed).unwrap();
        s.advance(StepId::Analyze, StepStatus::Completed).unwrap();
        s.record_detection(detected, serde_json::json!({"price": 425000}))
            .unwrap();
        s.advance(StepId::EffectiveDate, StepStatus::Completed).unwrap();
        s
    }

    /// Pointer sits on the last completed-or-processing step, everything
    /// before it is completed and everything after it pending.
    fn assert_ordered(s: &ScanSession) {
        let last_active = s
            .steps()
            .iter()
            .rposition(|st| {
                matches!(st.status, StepStatus::Completed | StepStatus::Processing)
            })
            .unwrap_or(0);
        assert_eq!(s.current_index(), last_active);
        for (i, st) in s.steps().iter().enumerate() {
            if i < s.current_index() {
                assert_eq!(st.status, StepStatus::Completed, "{}", st.id);
            } else if i > s.current_index() {
                assert_eq!(st.status, StepStatus::Pending, "{}", st.id);
            }
        }
        let processing = s
            .steps()
            .iter()
            .filter(|st| st.status == StepStatus::Processing)
            .count();
        assert!(processing <= 1);
    }

    #[test]
    fn new_session_is_all_pending() {
        let s = ScanSession::new();
        assert_eq!(s.current_step(), StepId::Upload);
        assert!(s.steps().iter().all(|st| st.status == StepStatus::Pending));
        assert!(!s.awaiting_confirmation());
    }

    #[test]
    fn completing_a_step_starts_the_next() {
        let mut s = ScanSession::new();
        s.advance(StepId::Upload, StepStatus::Processing).unwrap();
        assert_ordered(&s);
        s.advance(StepId::Upload, StepStatus::Completed).unwrap();
        assert_eq!(s.current_step(), StepId::Extract);
        assert_eq!(s.status(StepId::Extract), StepStatus::Processing);
        assert_ordered(&s);
    }

    #[test]
    fn out_of_order_advance_is_rejected() {
        let mut s = ScanSession::new();
        let err = s.advance(StepId::Analyze, StepStatus::Completed).unwrap_err();
        assert!(matches!(
            err,
            SessionError::OutOfOrder {
                expected: StepId::Upload,
                got: StepId::Analyze
            }
        ));
    }

    #[test]
    fn backwards_transition_is_rejected() {
        let mut s = ScanSession::new();
        s.advance(StepId::Upload, StepStatus::Processing).unwrap();
        let err = s.advance(StepId::Upload, StepStatus::Pending).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn pointer_stops_at_the_gate() {
        let s = at_gate(Some(date("2025-07-26")));
        assert_eq!(s.current_step(), StepId::ConfirmDate);
        assert_eq!(s.status(StepId::ConfirmDate), StepStatus::Processing);
        assert!(s.awaiting_confirmation());
        assert_ordered(&s);
    }

    #[test]
    fn completing_confirm_date_directly_does_not_move_pointer() {
        let mut s = at_gate(Some(date("2025-07-26")));
        s.advance(StepId::ConfirmDate, StepStatus::Completed).unwrap();
        assert_eq!(s.current_step(), StepId::ConfirmDate);
        assert_eq!(s.status(StepId::Generate), StepStatus::Pending);

        // The user can still confirm and move on.
        assert_eq!(s.confirm_effective_date().unwrap(), Some(date("2025-07-26")));
        assert_eq!(s.current_step(), StepId::Generate);
    }

    #[test]
    fn detection_seeds_effective_date() {
        let s = at_gate(Some(date("2025-07-26")));
        assert_eq!(s.gate().detected_date(), Some(date("2025-07-26")));
        assert_eq!(s.gate().effective_date(), Some(date("2025-07-26")));
        assert_eq!(s.extracted_data().unwrap()["price"], 425000);
    }

    #[test]
    fn set_effective_date_leaves_detected_alone() {
        let mut s = at_gate(Some(date("2025-07-26")));
        s.set_effective_date("2025-07-27").unwrap();
        assert_eq!(s.gate().detected_date(), Some(date("2025-07-26")));
        assert_eq!(s.gate().effective_date(), Some(date("2025-07-27")));
        assert!(s.snapshot().is_modified);
    }

    #[test]
    fn set_effective_date_before_gate_is_rejected() {
        let mut s = ScanSession::new();
        assert!(matches!(
            s.set_effective_date("2025-07-27"),
            Err(SessionError::GateClosed)
        ));
    }

    #[test]
    fn confirm_with_empty_date_is_a_noop() {
        let mut s = at_gate(Some(date("2025-07-26")));
        s.set_effective_date("").unwrap();
        let before = s.snapshot();
        assert_eq!(s.confirm_effective_date().unwrap(), None);
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn confirm_moves_to_generate_once() {
        let mut s = at_gate(Some(date("2025-07-26")));
        assert_eq!(s.confirm_effective_date().unwrap(), Some(date("2025-07-26")));
        assert_eq!(s.status(StepId::ConfirmDate), StepStatus::Completed);
        assert_eq!(s.status(StepId::Generate), StepStatus::Processing);
        assert!(s.snapshot().generating);
        assert_ordered(&s);

        // Second confirm while generating does nothing.
        assert_eq!(s.confirm_effective_date().unwrap(), None);
        assert!(matches!(
            s.set_effective_date("2025-08-01"),
            Err(SessionError::GateClosed)
        ));

        s.advance(StepId::Generate, StepStatus::Completed).unwrap();
        assert!(s.is_complete());
        assert_eq!(s.current_step(), StepId::Generate);
        assert!(!s.snapshot().generating);
    }

    #[test]
    fn failure_halts_everything() {
        let mut s = ScanSession::new();
        s.advance(StepId::Upload, StepStatus::Processing).unwrap();
        s.advance(StepId::Upload, StepStatus::Completed).unwrap();
        s.advance(StepId::Extract, StepStatus::Completed).unwrap();
        s.advance(StepId::Analyze, StepStatus::Completed).unwrap();

        let failed = s.fail("backend returned 502").unwrap();
        assert_eq!(failed, StepId::EffectiveDate);
        assert_eq!(s.status(StepId::EffectiveDate), StepStatus::Error);
        assert_eq!(s.failure().unwrap().reason, "backend returned 502");

        assert!(matches!(
            s.advance(StepId::EffectiveDate, StepStatus::Completed),
            Err(SessionError::Halted {
                step: StepId::EffectiveDate
            })
        ));
        assert!(s.confirm_effective_date().is_err());
        assert!(!s.awaiting_confirmation());
        for id in [StepId::ConfirmDate, StepId::Generate] {
            assert_eq!(s.status(id), StepStatus::Pending);
        }
    }

    #[test]
    fn completed_session_cannot_be_rewritten() {
        let mut s = at_gate(Some(date("2025-07-26")));
        s.confirm_effective_date().unwrap();
        s.advance(StepId::Generate, StepStatus::Completed).unwrap();
        assert!(s.is_complete());

        assert!(matches!(
            s.advance(StepId::Generate, StepStatus::Error),
            Err(SessionError::Completed)
        ));
        assert!(matches!(s.fail("late failure"), Err(SessionError::Completed)));
        assert!(matches!(
            s.advance(StepId::Generate, StepStatus::Completed),
            Err(SessionError::Completed)
        ));
        assert_eq!(s.status(StepId::Generate), StepStatus::Completed);
        assert!(s.is_complete());
        assert!(s.failure().is_none());
    }

    #[test]
    fn advance_error_halts_with_generic_reason() {
        let mut s = ScanSession::new();
        s.advance(StepId::Upload, StepStatus::Error).unwrap();
        assert_eq!(s.status(StepId::Upload), StepStatus::Error);
        assert_eq!(s.failure().unwrap().reason, "Document Upload failed");
    }

    #[test]
    fn second_failure_keeps_the_first() {
        let mut s = ScanSession::new();
        s.fail("first").unwrap();
        assert_eq!(s.fail("second").unwrap(), StepId::Upload);
        assert_eq!(s.failure().unwrap().reason, "first");
    }

    #[test]
    fn snapshot_serialises_camel_case() {
        let s = at_gate(Some(date("2025-07-26")));
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["currentIndex"], 4);
        assert_eq!(json["detectedDate"], "2025-07-26");
        assert_eq!(json["awaitingConfirmation"], true);
        assert_eq!(json["steps"][4]["status"], "processing");
    }
}

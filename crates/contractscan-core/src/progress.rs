//! Pure progress rendering: `(steps, current_index)` → per-step visual state.
//!
//! Front ends decide how a [`Marker`] or [`Tone`] actually looks; this module
//! only decides which one applies.

use serde::Serialize;

use crate::step::{ScanStep, StepId, StepStatus};

/// What sits in the step bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum Marker {
    /// 1-based step number, shown while pending.
    Number(usize),
    Check,
    Spinner,
    Alert,
}

/// Emphasis colour of the step bubble and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Muted,
    Active,
    Success,
    Danger,
}

/// Line joining a step to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connector {
    /// At or past the pointer.
    Idle,
    /// Before the pointer, step not (yet) completed.
    Active,
    /// Before the pointer, step completed.
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepLine {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
    pub marker: Marker,
    pub tone: Tone,
    /// `None` for the last step.
    pub connector: Option<Connector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressView {
    pub lines: Vec<StepLine>,
    pub all_completed: bool,
}

pub fn render_progress(steps: &[ScanStep], current_index: usize) -> ProgressView {
    let last = steps.len().saturating_sub(1);
    let lines = steps
        .iter()
        .enumerate()
        .map(|(index, step)| StepLine {
            id: step.id,
            title: step.title.clone(),
            description: step.description.clone(),
            status: step.status,
            marker: marker(step.status, index),
            tone: tone(step.status),
            connector: (index < last).then(|| connector(step.status, index, current_index)),
        })
        .collect();

    ProgressView {
        lines,
        all_completed: !steps.is_empty()
            && steps.iter().all(|s| s.status == StepStatus::Completed),
    }
}

fn marker(status: StepStatus, index: usize) -> Marker {
    match status {
        StepStatus::Completed => Marker::Check,
        StepStatus::Processing => Marker::Spinner,
        StepStatus::Error => Marker::Alert,
        StepStatus::Pending => Marker::Number(index + 1),
    }
}

fn tone(status: StepStatus) -> Tone {
    match status {
        StepStatus::Completed => Tone::Success,
        StepStatus::Processing => Tone::Active,
        StepStatus::Error => Tone::Danger,
        StepStatus::Pending => Tone::Muted,
    }
}

fn connector(status: StepStatus, index: usize, current_index: usize) -> Connector {
    if index >= current_index {
        Connector::Idle
    } else if status == StepStatus::Completed {
        Connector::Done
    } else {
        Connector::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScanSession;

    #[test]
    fn fresh_session_shows_numbers() {
        let s = ScanSession::new();
        let view = render_progress(s.steps(), s.current_index());
        assert_eq!(view.lines.len(), 6);
        assert_eq!(view.lines[0].marker, Marker::Number(1));
        assert_eq!(view.lines[5].marker, Marker::Number(6));
        assert!(view.lines.iter().all(|l| l.tone == Tone::Muted));
        assert!(!view.all_completed);
        assert_eq!(view.lines[5].connector, None);
    }

    #[test]
    fn reflects_statuses_and_connectors() {
        let mut s = ScanSession::new();
        s.advance(StepId::Upload, StepStatus::Processing).unwrap();
        s.advance(StepId::Upload, StepStatus::Completed).unwrap();
        s.advance(StepId::Extract, StepStatus::Completed).unwrap();
        let view = render_progress(s.steps(), s.current_index());

        assert_eq!(view.lines[0].marker, Marker::Check);
        assert_eq!(view.lines[0].connector, Some(Connector::Done));
        assert_eq!(view.lines[1].connector, Some(Connector::Done));
        assert_eq!(view.lines[2].marker, Marker::Spinner);
        assert_eq!(view.lines[2].tone, Tone::Active);
        assert_eq!(view.lines[2].connector, Some(Connector::Idle));
        assert_eq!(view.lines[3].marker, Marker::Number(4));
    }

    #[test]
    fn error_step_is_flagged() {
        let mut s = ScanSession::new();
        s.fail("not a PDF").unwrap();
        let view = render_progress(s.steps(), s.current_index());
        assert_eq!(view.lines[0].marker, Marker::Alert);
        assert_eq!(view.lines[0].tone, Tone::Danger);
        assert!(!view.all_completed);
    }

    #[test]
    fn uncompleted_step_behind_pointer_is_active() {
        let mut steps: Vec<ScanStep> = crate::step::STEP_ORDER
            .iter()
            .map(|id| ScanStep::pending(*id))
            .collect();
        steps[0].status = StepStatus::Processing;
        let view = render_progress(&steps, 2);
        assert_eq!(view.lines[0].connector, Some(Connector::Active));
    }

    #[test]
    fn all_completed_banner() {
        let mut steps: Vec<ScanStep> = crate::step::STEP_ORDER
            .iter()
            .map(|id| ScanStep::pending(*id))
            .collect();
        for step in &mut steps {
            step.status = StepStatus::Completed;
        }
        assert!(render_progress(&steps, 5).all_completed);
        assert!(!render_progress(&[], 0).all_completed);
    }
}

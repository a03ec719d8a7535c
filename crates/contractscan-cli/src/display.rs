//! Terminal rendering for scan progress and the date gate.
//!
//! Everything goes to stderr; stdout is reserved for the JSON result.

use std::sync::Mutex;

use chrono::NaiveDate;
use contractscan_core::{
    DateGate, Marker, ScanSnapshot, StepLine, StepStatus, Upload, render_progress,
};
use contractscan_scan::ScanObserver;

// ── Progress ──

/// Prints a line for every step whose status changed since the last update.
#[derive(Default)]
pub struct ProgressPrinter {
    seen: Mutex<Vec<StepStatus>>,
}

impl ProgressPrinter {
    fn changed_lines(&self, snapshot: &ScanSnapshot) -> Vec<String> {
        let view = render_progress(&snapshot.steps, snapshot.current_index);
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if seen.len() != view.lines.len() {
            *seen = vec![StepStatus::Pending; view.lines.len()];
        }

        let mut out = Vec::new();
        for (i, line) in view.lines.iter().enumerate() {
            if seen[i] != line.status {
                seen[i] = line.status;
                out.push(format_step(line));
            }
        }
        if let Some(failure) = &snapshot.failure {
            out.push(format!("      {}", failure.reason));
        }
        if view.all_completed {
            out.push(String::new());
            out.push("Contract Processed Successfully!".to_string());
            out.push(
                "Your transaction has been set up with tasks and deadlines based on the contract terms."
                    .to_string(),
            );
        }
        out
    }
}

impl ScanObserver for ProgressPrinter {
    fn on_update(&self, snapshot: &ScanSnapshot) {
        for line in self.changed_lines(snapshot) {
            eprintln!("{line}");
        }
    }
}

fn glyph(marker: Marker) -> String {
    match marker {
        Marker::Number(n) => n.to_string(),
        Marker::Check => "✓".to_string(),
        Marker::Spinner => "…".to_string(),
        Marker::Alert => "!".to_string(),
    }
}

fn format_step(line: &StepLine) -> String {
    let detail = match line.status {
        StepStatus::Processing => line.description.as_str(),
        other => other.as_str(),
    };
    format!("  [{}] {:<26} {}", glyph(line.marker), line.title, detail)
}

// ── Document ──

pub fn print_document(upload: &Upload) {
    eprintln!("Scanning Contract");
    eprintln!("  {:<26} {}", "document", upload.display_name());
    eprintln!("  {:<26} {}", "size", upload.size_label());
    eprintln!();
}

// ── Date gate ──

/// `Saturday, July 26, 2025`.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn print_gate(gate: &DateGate) {
    eprintln!();
    eprintln!("Confirm Effective Date");
    eprintln!("This date determines all other contract deadlines");
    if let Some(detected) = gate.detected_date() {
        eprintln!("  {:<26} {}", "detected from contract", long_date(detected));
    } else {
        eprintln!("  {:<26} (none found)", "detected from contract");
    }
    match gate.effective_date() {
        Some(date) => eprintln!("  {:<26} {} ({date})", "effective date *", long_date(date)),
        None => eprintln!("  {:<26} (required)", "effective date *"),
    }
    if gate.is_modified() && gate.effective_date().is_some() {
        eprintln!("  Date Modified: you've changed the date from what was detected in the contract.");
        eprintln!("  Make sure this is correct as it affects all deadlines.");
    }
}

pub fn print_steps() {
    for (i, id) in contractscan_core::STEP_ORDER.iter().enumerate() {
        println!("{:>2}. {:<16} {:<26} {}", i + 1, id.as_str(), id.title(), id.description());
    }
}

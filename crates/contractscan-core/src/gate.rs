//! Effective-date confirmation gate.
//!
//! The gate holds the date detected in the contract and the date the user
//! intends to use. Progression to timeline generation waits on
//! [`DateGate::on_confirm`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::session::SessionError;

/// Input format of a calendar date (`<input type="date">` style).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateGate {
    detected: Option<NaiveDate>,
    effective: Option<NaiveDate>,
    in_flight: bool,
}

impl DateGate {
    /// A gate whose effective date starts at the detected one.
    pub fn seeded(detected: Option<NaiveDate>) -> Self {
        Self {
            detected,
            effective: detected,
            in_flight: false,
        }
    }

    pub fn detected_date(&self) -> Option<NaiveDate> {
        self.detected
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective
    }

    /// True when the user moved away from the detected date. Display only.
    pub fn is_modified(&self) -> bool {
        self.effective != self.detected
    }

    /// Whether generation has been requested and not yet finished.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn can_confirm(&self) -> bool {
        self.effective.is_some() && !self.in_flight
    }

    /// Replace the effective date from raw user input.
    ///
    /// Empty (or whitespace) input clears the date, which disables confirm.
    pub fn on_date_change(&mut self, value: &str) -> Result<(), SessionError> {
        self.effective = parse_date_input(value)?;
        Ok(())
    }

    /// Request confirmation. Returns the confirmed date and marks generation
    /// in flight, or `None` when confirm is disabled.
    pub fn on_confirm(&mut self) -> Option<NaiveDate> {
        if !self.can_confirm() {
            return None;
        }
        self.in_flight = true;
        self.effective
    }
}

/// Parse a `YYYY-MM-DD` date; empty input means "no date".
pub fn parse_date_input(value: &str) -> Result<Option<NaiveDate>, SessionError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|source| SessionError::InvalidDate {
            value: value.to_string(),
            source,
        })
}

//! Wire format of the analysis backend's reply.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{Analysis, AnalyzeError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// JSON body returned by the backend:
/// `{ "structuredData": {...}, "effectiveDate": "YYYY-MM-DD" | null }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub structured_data: serde_json::Value,
    #[serde(default)]
    pub effective_date: Option<String>,
}

impl AnalyzeResponse {
    /// Resolve the effective date and hand back the payload untouched.
    ///
    /// A top-level `effectiveDate` wins over `structuredData.effectiveDate`.
    /// Absent or blank means "not detected"; anything else must parse.
    pub fn into_analysis(self) -> Result<Analysis, AnalyzeError> {
        let not_blank = |s: &String| !s.trim().is_empty();
        let raw = self.effective_date.filter(not_blank).or_else(|| {
            self.structured_data
                .get("effectiveDate")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .filter(not_blank)
        });

        let effective_date = match raw {
            Some(value) => Some(
                NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
                    .map_err(|_| AnalyzeError::MalformedDate { value })?,
            ),
            None => None,
        };

        Ok(Analysis {
            structured_data: self.structured_data,
            effective_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Analysis, AnalyzeError> {
        serde_json::from_str::<AnalyzeResponse>(json)
            .unwrap()
            .into_analysis()
    }

    #[test]
    fn top_level_date() {
        let analysis = parse(
            r#"{
                "structuredData": {"buyer": "J. Smith", "price": 425000},
                "effectiveDate": "2025-07-26"
            }"#,
        )
        .unwrap();
        assert_eq!(
            analysis.effective_date,
            NaiveDate::from_ymd_opt(2025, 7, 26)
        );
        assert_eq!(analysis.structured_data["buyer"], "J. Smith");
    }

    #[test]
    fn nested_date_fallback() {
        let analysis =
            parse(r#"{"structuredData": {"effectiveDate": "2024-12-01"}}"#).unwrap();
        assert_eq!(
            analysis.effective_date,
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
    }

    #[test]
    fn blank_top_level_date_falls_back_to_nested() {
        let analysis = parse(
            r#"{"structuredData": {"effectiveDate": "2024-12-01"}, "effectiveDate": ""}"#,
        )
        .unwrap();
        assert_eq!(
            analysis.effective_date,
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
        let analysis = parse(
            r#"{"structuredData": {"effectiveDate": "2024-12-01"}, "effectiveDate": "   "}"#,
        )
        .unwrap();
        assert_eq!(
            analysis.effective_date,
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
    }

    #[test]
    fn missing_or_null_date_is_not_detected() {
        assert_eq!(parse(r#"{"structuredData": {}}"#).unwrap().effective_date, None);
        assert_eq!(
            parse(r#"{"structuredData": {}, "effectiveDate": null}"#)
                .unwrap()
                .effective_date,
            None
        );
        assert_eq!(
            parse(r#"{"effectiveDate": "  "}"#).unwrap().effective_date,
            None
        );
    }

    #[test]
    fn malformed_date_is_an_error() {
        let err = parse(r#"{"effectiveDate": "July 26th"}"#).unwrap_err();
        match err {
            AnalyzeError::MalformedDate { value } => assert_eq!(value, "July 26th"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_payload_defaults_to_null() {
        let analysis = parse(r#"{"effectiveDate": "2025-07-26"}"#).unwrap();
        assert!(analysis.structured_data.is_null());
    }
}

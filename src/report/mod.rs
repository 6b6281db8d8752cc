//! Output reporters for analysis results
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON, byte-identical across runs on
//!   unchanged input

mod json;
mod text;

use anyhow::{anyhow, Result};
use std::str::FromStr;

use crate::models::AnalysisReport;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a report in the specified format.
pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{
        RunStatus, Severity, SkipReason, SkippedUnit, Violation, ViolationKind, ViolationsSummary,
    };

    pub(crate) fn test_report() -> AnalysisReport {
        AnalysisReport {
            status: RunStatus::Complete,
            clean: false,
            severity_threshold: Severity::Error,
            summary: ViolationsSummary::default(),
            violations: vec![
                Violation::new(
                    ViolationKind::OverLoad,
                    "shop.OrderResource",
                    Severity::Error,
                    "method 'submit' scores 8 against the controller ceiling of 7",
                )
                .with_method("submit")
                .with_score(8, 7),
                Violation::new(
                    ViolationKind::LowCohesion,
                    "shop.Warehouse",
                    Severity::Warning,
                    "methods partition into 2 disjoint member-usage groups (cohesion ratio 0.50)",
                ),
            ],
            advisories: vec![],
            skipped_units: vec![SkippedUnit {
                source: "broken.json".to_string(),
                reason: SkipReason::ParseError,
                message: "unreadable source".to_string(),
            }],
            units: vec![],
        }
        .finalize()
    }

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("TEXT").unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_str("sarif").is_err());
    }
}

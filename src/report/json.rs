//! JSON reporter
//!
//! Outputs the full report as pretty-printed JSON. Field order is fixed
//! and every collection is pre-sorted, so unchanged input renders to
//! byte-identical output across runs.

use anyhow::Result;

use crate::models::AnalysisReport;

/// Render report as JSON
pub fn render(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

//! Core data models for Cogload
//!
//! These models are used throughout the codebase for representing
//! violations, advisories, skipped units, and the final analysis report.

use serde::{Deserialize, Serialize};

/// Generate a deterministic violation ID based on content hash.
///
/// Stable IDs across runs enable tracking violations over time and
/// reliable deduplication. The ID is a 16-character hex string derived
/// from hashing the violation kind, unit id, method id, and message.
pub fn deterministic_violation_id(
    kind: ViolationKind,
    unit_id: &str,
    method_id: Option<&str>,
    message: &str,
) -> String {
    let input = format!(
        "{kind}\n{unit_id}\n{}\n{message}",
        method_id.unwrap_or_default()
    );
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(input.as_bytes()))
}

/// Severity levels for violations, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!(
                "unknown severity '{other}'. Valid severities: info, warning, error"
            )),
        }
    }
}

/// Kinds of violations the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    OverLoad,
    LowCohesion,
    DivergentChange,
    ShotgunSurgery,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::OverLoad => write!(f, "OverLoad"),
            ViolationKind::LowCohesion => write!(f, "LowCohesion"),
            ViolationKind::DivergentChange => write!(f, "DivergentChange"),
            ViolationKind::ShotgunSurgery => write!(f, "ShotgunSurgery"),
        }
    }
}

/// One suggested extraction boundary: methods that form a responsibility
/// cluster together with the members they touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitGroup {
    pub methods: Vec<String>,
    pub members: Vec<String>,
}

/// A single analysis violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub id: String,
    pub kind: ViolationKind,
    pub unit_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub threshold: Option<u32>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suggested_split: Option<Vec<SplitGroup>>,
}

impl Violation {
    /// Build a violation with a deterministic id derived from its content.
    pub fn new(
        kind: ViolationKind,
        unit_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let unit_id = unit_id.into();
        let message = message.into();
        Self {
            id: deterministic_violation_id(kind, &unit_id, None, &message),
            kind,
            unit_id,
            method_id: None,
            score: None,
            threshold: None,
            severity,
            message,
            suggested_split: None,
        }
    }

    pub fn with_method(mut self, method_id: impl Into<String>) -> Self {
        let method_id = method_id.into();
        self.id =
            deterministic_violation_id(self.kind, &self.unit_id, Some(&method_id), &self.message);
        self.method_id = Some(method_id);
        self
    }

    pub fn with_score(mut self, score: u32, threshold: u32) -> Self {
        self.score = Some(score);
        self.threshold = Some(threshold);
        self
    }

    pub fn with_split(mut self, split: Vec<SplitGroup>) -> Self {
        self.suggested_split = Some(split);
        self
    }
}

/// Info-level note that never affects the exit code.
///
/// Used for "possibly over-extracted" methods and for score entries of
/// unclassified units, where no ceiling is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub unit_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method_id: Option<String>,
    pub severity: Severity,
    pub message: String,
}

impl Advisory {
    pub fn info(unit_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            method_id: None,
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(unit_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            method_id: None,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn with_method(mut self, method_id: impl Into<String>) -> Self {
        self.method_id = Some(method_id.into());
        self
    }
}

/// Why a unit was excluded from analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The source could not be read or parsed.
    ParseError,
    /// The unit failed an internal consistency check.
    InvariantViolation,
}

/// A unit (or whole source file) excluded from the run.
///
/// Skipped units are attached to the report rather than aborting the run;
/// under `--strict-parse` their presence drives exit code 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedUnit {
    /// Unit id when known, otherwise the source path.
    pub source: String,
    pub reason: SkipReason,
    pub message: String,
}

/// Per-method score entry on a unit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodScore {
    pub method_id: String,
    pub score: u32,
}

/// Score summary for one analyzed unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub unit_id: String,
    pub role: crate::source::Role,
    /// Aggregate per the configured policy (sum of methods by default).
    pub aggregate_score: u32,
    pub methods: Vec<MethodScore>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cohesion_ratio: Option<f64>,
}

/// Whether the run finished or observed cancellation mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Complete,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Violation counts by severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationsSummary {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

impl ViolationsSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self::default();
        for v in violations {
            match v.severity {
                Severity::Error => summary.error += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Final merged report for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub status: RunStatus,
    /// True iff no violation at or above the severity threshold exists.
    /// Sole driver of the external exit code.
    pub clean: bool,
    pub severity_threshold: Severity,
    pub summary: ViolationsSummary,
    pub violations: Vec<Violation>,
    pub advisories: Vec<Advisory>,
    pub skipped_units: Vec<SkippedUnit>,
    pub units: Vec<UnitReport>,
}

impl AnalysisReport {
    /// Sort everything into deterministic order and derive the verdict.
    ///
    /// Violations sort by severity (most severe first), then unit id, then
    /// kind, then method id. Insertion order from the parallel accumulator
    /// is irrelevant after this point.
    pub fn finalize(mut self) -> Self {
        self.violations.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.method_id.cmp(&b.method_id))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.advisories.sort_by(|a, b| {
            a.unit_id
                .cmp(&b.unit_id)
                .then_with(|| a.method_id.cmp(&b.method_id))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.skipped_units.sort_by(|a, b| a.source.cmp(&b.source));
        self.units.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        self.summary = ViolationsSummary::from_violations(&self.violations);
        let threshold = self.severity_threshold;
        self.clean = !self.violations.iter().any(|v| v.severity >= threshold);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn deterministic_ids_are_stable() {
        let a = deterministic_violation_id(ViolationKind::OverLoad, "u", Some("m"), "msg");
        let b = deterministic_violation_id(ViolationKind::OverLoad, "u", Some("m"), "msg");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);

        let c = deterministic_violation_id(ViolationKind::OverLoad, "u", Some("m2"), "msg");
        assert_ne!(a, c);
    }

    #[test]
    fn finalize_sorts_and_derives_verdict() {
        let report = AnalysisReport {
            status: RunStatus::Complete,
            clean: true,
            severity_threshold: Severity::Error,
            summary: ViolationsSummary::default(),
            violations: vec![
                Violation::new(
                    ViolationKind::DivergentChange,
                    "b.Unit",
                    Severity::Info,
                    "drift",
                ),
                Violation::new(ViolationKind::OverLoad, "a.Unit", Severity::Error, "over"),
            ],
            advisories: vec![],
            skipped_units: vec![],
            units: vec![],
        };

        let report = report.finalize();
        assert_eq!(report.violations[0].kind, ViolationKind::OverLoad);
        assert!(!report.clean);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.error, 1);
    }

    #[test]
    fn warnings_do_not_break_error_threshold() {
        let report = AnalysisReport {
            status: RunStatus::Complete,
            clean: false,
            severity_threshold: Severity::Error,
            summary: ViolationsSummary::default(),
            violations: vec![Violation::new(
                ViolationKind::LowCohesion,
                "u",
                Severity::Warning,
                "split",
            )],
            advisories: vec![],
            skipped_units: vec![],
            units: vec![],
        };
        assert!(report.finalize().clean);
    }
}

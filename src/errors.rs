//! Error taxonomy for the analysis engine
//!
//! Per-unit failures (`ParseError`, `InvariantViolation`) are recoverable:
//! the unit is skipped and reported. Configuration failures are fatal and
//! abort before analysis, since a broken threshold table would produce a
//! misleading pass/fail verdict.

use thiserror::Error;

/// Errors raised while building or analyzing a structural model.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A source unit could not be read or parsed. Recoverable: the unit
    /// becomes a skipped-unit record on the report.
    #[error("failed to parse {source_path}: {message}")]
    Parse {
        source_path: String,
        message: String,
    },

    /// Invalid configuration (threshold table, marker map, severity map).
    /// Fatal: no report is produced.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A unit carried markers that resolve to more than one role.
    /// Recoverable: the unit is treated as unclassified with a warning.
    #[error("ambiguous role markers on unit {unit_id}: {markers}")]
    ClassificationAmbiguity { unit_id: String, markers: String },

    /// Internal consistency failure inside one unit, e.g. a method
    /// referencing a member its unit does not declare. Fatal for that unit
    /// only; the unit is excluded and reported, never silently dropped.
    #[error("invariant violation in unit {unit_id}: {message}")]
    Invariant { unit_id: String, message: String },
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config(message.into())
    }

    pub fn parse(source_path: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Parse {
            source_path: source_path.into(),
            message: message.into(),
        }
    }

    pub fn invariant(unit_id: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Invariant {
            unit_id: unit_id.into(),
            message: message.into(),
        }
    }
}

//! Front-end adapter contract and the bundled JSON model adapter
//!
//! Concrete parsing is delegated to per-ecosystem front-ends: an adapter
//! turns one source file into raw units carrying ecosystem-specific role
//! markers and body fragment trees. The bundled adapter reads the
//! normalized JSON model format those front-ends emit.

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::errors::EngineError;

/// Kind of a body fragment in the fixed counting taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Branch,
    Loop,
    Try,
    Catch,
    Lambda,
    Stream,
}

/// One node of a method body fragment tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFragment {
    pub kind: FragmentKind,
    #[serde(default)]
    pub children: Vec<RawFragment>,
    /// Stage count for stream pipelines; ignored for other kinds.
    #[serde(default)]
    pub stages: Option<u32>,
}

/// A field as supplied by a front-end.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMember {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Explicit collaborator classification; when absent the builder
    /// classifies from the type descriptor.
    #[serde(default)]
    pub collaborator: Option<bool>,
}

/// A method as supplied by a front-end.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMethod {
    pub id: String,
    /// Member ids this method references.
    #[serde(default)]
    pub reads: Vec<String>,
    /// Unit ids this method calls into.
    #[serde(default)]
    pub calls: Vec<String>,
    #[serde(default)]
    pub body: Vec<RawFragment>,
}

/// A unit as supplied by a front-end, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawUnit {
    pub id: String,
    /// Ecosystem-specific role markers (framework annotations etc.).
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub methods: Vec<RawMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    units: Vec<RawUnit>,
}

/// Per-ecosystem front-end supplying the normalized structural model.
///
/// Implementations parse one source file into raw units; the builder owns
/// classification, categorization, and invariant checking. Adapters must
/// be `Send + Sync` since files are parsed in parallel.
pub trait FrontEndAdapter: Send + Sync {
    /// Adapter name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this adapter handles the given path.
    fn can_parse(&self, path: &Path) -> bool;

    /// Parse one source file into raw units.
    fn parse(&self, path: &Path, text: &str) -> Result<Vec<RawUnit>, EngineError>;
}

/// Bundled adapter for the normalized JSON model format.
#[derive(Debug, Default)]
pub struct JsonModelAdapter;

impl JsonModelAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FrontEndAdapter for JsonModelAdapter {
    fn name(&self) -> &'static str {
        "json-model"
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "json")
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<RawUnit>, EngineError> {
        let model: ModelFile = serde_json::from_str(text)
            .map_err(|e| EngineError::parse(path.display().to_string(), e.to_string()))?;
        Ok(model.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_file() {
        let text = r#"{
            "units": [{
                "id": "shop.Order",
                "markers": ["entity"],
                "members": [{"id": "lines", "type": "java.util.List"}],
                "methods": [{
                    "id": "total",
                    "reads": ["lines"],
                    "body": [{"kind": "loop", "children": [{"kind": "branch"}]}]
                }]
            }]
        }"#;

        let units = JsonModelAdapter::new()
            .parse(Path::new("order.json"), text)
            .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id, "shop.Order");
        assert_eq!(units[0].methods[0].body[0].children.len(), 1);
    }

    #[test]
    fn rejects_malformed_model() {
        let err = JsonModelAdapter::new()
            .parse(Path::new("broken.json"), "{\"units\": [{}]}")
            .unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn only_claims_json_files() {
        let adapter = JsonModelAdapter::new();
        assert!(adapter.can_parse(Path::new("model.json")));
        assert!(!adapter.can_parse(Path::new("model.yaml")));
    }
}

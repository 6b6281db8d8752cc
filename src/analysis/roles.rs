//! Role classifier
//!
//! Resolves a unit's architectural role from the markers its front-end
//! adapter supplied. Marker semantics are ecosystem-specific and come from
//! a pluggable mapping; canonical role names resolve without any mapping.
//! The classifier never guesses: no marker means `Unclassified`, and
//! markers resolving to different roles are an ambiguity warning, not a
//! silent default.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::source::{Role, StructuralUnit};

/// Result of classifying one unit.
pub struct Classification {
    pub role: Role,
    /// Present when markers resolved to conflicting roles.
    pub ambiguity: Option<String>,
}

/// Marker-driven role resolution.
pub struct RoleClassifier {
    markers: FxHashMap<String, Role>,
}

impl RoleClassifier {
    /// Build a classifier from an ecosystem marker map. Keys are matched
    /// case-insensitively; canonical role names resolve implicitly.
    pub fn new(markers: FxHashMap<String, Role>) -> Self {
        Self { markers }
    }

    fn resolve(&self, marker: &str) -> Option<Role> {
        let key = marker.to_lowercase();
        self.markers
            .get(&key)
            .copied()
            .or_else(|| Role::from_canonical(&key))
    }

    pub fn classify(&self, unit: &StructuralUnit) -> Classification {
        let mut resolved: Vec<(String, Role)> = Vec::new();
        for marker in &unit.markers {
            match self.resolve(marker) {
                Some(role) => resolved.push((marker.clone(), role)),
                None => debug!("unit {}: marker '{}' has no mapping", unit.id, marker),
            }
        }

        let mut roles: Vec<Role> = resolved.iter().map(|(_, r)| *r).collect();
        roles.sort();
        roles.dedup();

        match roles.len() {
            0 => Classification {
                role: Role::Unclassified,
                ambiguity: None,
            },
            1 => Classification {
                role: roles[0],
                ambiguity: None,
            },
            _ => {
                let markers: Vec<String> = resolved
                    .iter()
                    .map(|(m, r)| format!("{m} => {r}"))
                    .collect();
                Classification {
                    role: Role::Unclassified,
                    ambiguity: Some(format!(
                        "conflicting role markers ({}); unit treated as unclassified",
                        markers.join(", ")
                    )),
                }
            }
        }
    }
}

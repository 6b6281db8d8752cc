//! Normalized structural model
//!
//! The model is language-agnostic: a front-end adapter supplies raw units
//! and the builder normalizes them into `StructuralUnit`s owning their
//! members and methods. The graph is immutable once built for a run; all
//! scores and cohesion records are derived from it on demand.

pub mod adapter;
pub mod builder;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Architectural role of a unit, determining its score ceiling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Controller,
    DomainService,
    ApplicationService,
    Entity,
    ValueObject,
    Repository,
    #[default]
    Unclassified,
}

impl Role {
    /// Canonical role names accepted directly as markers (case-insensitive).
    pub fn from_canonical(name: &str) -> Option<Role> {
        match name.to_lowercase().as_str() {
            "controller" => Some(Role::Controller),
            "domain-service" => Some(Role::DomainService),
            "application-service" => Some(Role::ApplicationService),
            "entity" => Some(Role::Entity),
            "value-object" => Some(Role::ValueObject),
            "repository" => Some(Role::Repository),
            _ => None,
        }
    }

    /// Whether the unit-level aggregate is checked against the ceiling
    /// instead of each method's own score. Entities and value objects
    /// legitimately concentrate more behavior.
    pub fn uses_aggregate_ceiling(&self) -> bool {
        matches!(self, Role::Entity | Role::ValueObject)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Controller => write!(f, "controller"),
            Role::DomainService => write!(f, "domain-service"),
            Role::ApplicationService => write!(f, "application-service"),
            Role::Entity => write!(f, "entity"),
            Role::ValueObject => write!(f, "value-object"),
            Role::Repository => write!(f, "repository"),
            Role::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Category of a single load contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionCategory {
    CollaboratorReference,
    Branch,
    NestedBranch,
    Loop,
    Try,
    Catch,
    Lambda,
    StreamStage,
}

/// One counted load unit inside a method body.
///
/// The base value is always 1; a contribution lexically nested inside
/// another branch or loop carries one extra point on top of its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadContribution {
    pub category: ContributionCategory,
    pub nested: bool,
}

impl LoadContribution {
    pub fn new(category: ContributionCategory, nested: bool) -> Self {
        Self { category, nested }
    }

    pub fn points(&self) -> u32 {
        1 + u32::from(self.nested)
    }
}

/// A field of a structural unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// Type descriptor as supplied by the front-end adapter.
    pub type_name: String,
    /// Custom system type vs. primitive/standard type. Only collaborator
    /// types count toward load and cohesion.
    pub is_collaborator: bool,
}

/// A method of a structural unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub id: String,
    /// Back-reference by id; the unit owns the method, not the reverse.
    pub unit_id: String,
    /// Member ids this method references, sorted for determinism.
    pub referenced_members: Vec<String>,
    pub contributions: Vec<LoadContribution>,
    /// Ids of other units this method calls into, sorted.
    pub called_units: Vec<String>,
}

impl Method {
    /// Referenced members restricted to collaborator-typed ones.
    pub fn referenced_collaborators<'a>(&'a self, unit: &'a StructuralUnit) -> Vec<&'a str> {
        self.referenced_members
            .iter()
            .filter(|id| {
                unit.members
                    .iter()
                    .any(|m| &m.id == *id && m.is_collaborator)
            })
            .map(String::as_str)
            .collect()
    }
}

/// Language-agnostic stand-in for a class or component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralUnit {
    pub id: String,
    pub role: Role,
    /// Raw role markers from the front-end adapter, before resolution.
    pub markers: Vec<String>,
    pub members: Vec<Member>,
    pub methods: Vec<Method>,
    /// Source file the unit was parsed from.
    pub source_path: String,
}

impl StructuralUnit {
    pub fn collaborator_members(&self) -> Vec<&Member> {
        self.members.iter().filter(|m| m.is_collaborator).collect()
    }
}

/// Immutable structural graph for one analysis run.
#[derive(Debug, Default)]
pub struct ModelGraph {
    units: Vec<StructuralUnit>,
    index: FxHashMap<String, usize>,
}

impl ModelGraph {
    /// Build the graph from normalized units. Caller guarantees unique ids.
    pub fn new(units: Vec<StructuralUnit>) -> Self {
        let index = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id.clone(), i))
            .collect();
        Self { units, index }
    }

    pub fn units(&self) -> &[StructuralUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, unit_id: &str) -> Option<&StructuralUnit> {
        self.index.get(unit_id).map(|&i| &self.units[i])
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.index.contains_key(unit_id)
    }

    /// Whether two units share any structural relationship: a call edge or
    /// a member typed by the other unit, in either direction.
    pub fn structurally_related(&self, a: &str, b: &str) -> bool {
        let (Some(ua), Some(ub)) = (self.get(a), self.get(b)) else {
            return false;
        };
        Self::references(ua, &ub.id) || Self::references(ub, &ua.id)
    }

    fn references(from: &StructuralUnit, to_id: &str) -> bool {
        from.methods
            .iter()
            .any(|m| m.called_units.iter().any(|c| c == to_id))
            || from.members.iter().any(|m| m.type_name == to_id)
    }
}

//! Configuration for an analysis run
//!
//! Loads the threshold table, cohesion floor, severity map, and counting
//! policies from a `cogload.toml`-style file (TOML or JSON). Everything is
//! loaded once into an immutable value and passed explicitly into each
//! component; there is no ambient mutable state. An invalid configuration
//! is fatal before analysis starts, since continuing on a broken threshold
//! table could produce a misleading pass/fail verdict.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use crate::errors::EngineError;
use crate::models::Severity;
use crate::source::Role;

/// How stream pipelines are counted. The source rubric is inconsistent on
/// this, so it is a policy, not a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StreamCounting {
    /// Each pipeline stage contributes 1.
    #[default]
    PerStage,
    /// The whole chain contributes 1.
    WholeChain,
}

/// How an entity/value-object unit aggregate is computed from its methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregate {
    #[default]
    SumOfMethods,
    MaxMethod,
}

/// Immutable role → max score table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RoleThresholds {
    pub controller: u32,
    pub domain_service: u32,
    pub application_service: u32,
    pub entity: u32,
    pub value_object: u32,
    pub repository: u32,
}

impl Default for RoleThresholds {
    fn default() -> Self {
        Self {
            controller: 7,
            domain_service: 7,
            application_service: 7,
            entity: 9,
            value_object: 9,
            repository: 5,
        }
    }
}

impl RoleThresholds {
    /// Score ceiling for a role. Unclassified units have no ceiling: they
    /// are scored and reported, never enforced.
    pub fn ceiling(&self, role: Role) -> Option<u32> {
        match role {
            Role::Controller => Some(self.controller),
            Role::DomainService => Some(self.domain_service),
            Role::ApplicationService => Some(self.application_service),
            Role::Entity => Some(self.entity),
            Role::ValueObject => Some(self.value_object),
            Role::Repository => Some(self.repository),
            Role::Unclassified => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CohesionConfig {
    /// Cohesion ratio below which a unit is flagged.
    pub floor: f64,
}

impl Default for CohesionConfig {
    fn default() -> Self {
        Self { floor: 0.5 }
    }
}

/// Severity assigned to each violation kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SeverityConfig {
    pub over_load: Severity,
    pub low_cohesion: Severity,
    pub divergent_change: Severity,
    pub shotgun_surgery: Severity,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            over_load: Severity::Error,
            low_cohesion: Severity::Warning,
            divergent_change: Severity::Info,
            shotgun_surgery: Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Policies {
    pub stream_counting: StreamCounting,
    pub aggregate: Aggregate,
}

/// Tuning for the optional co-change (shotgun surgery) path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CoChangeConfig {
    /// Records within this many seconds form one change event
    /// (0 = same second).
    pub window_secs: i64,
    /// Minimum shared events before a unit pair counts as co-changing.
    pub min_events: usize,
    /// Minimum cluster size flagged as scattered.
    pub min_cluster: usize,
}

impl Default for CoChangeConfig {
    fn default() -> Self {
        Self {
            window_secs: 0,
            min_events: 3,
            min_cluster: 3,
        }
    }
}

/// Complete, immutable configuration for one run.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    pub thresholds: RoleThresholds,
    pub cohesion: CohesionConfig,
    pub severities: SeverityConfig,
    pub policies: Policies,
    pub cochange: CoChangeConfig,
    /// Minimum severity causing a non-zero exit; the CLI flag overrides.
    pub severity_threshold: Option<Severity>,
}

impl EngineConfig {
    fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.cohesion.floor) {
            return Err(EngineError::config(format!(
                "cohesion floor must be within 0.0..=1.0, got {}",
                self.cohesion.floor
            )));
        }
        let t = &self.thresholds;
        for (role, value) in [
            ("controller", t.controller),
            ("domain-service", t.domain_service),
            ("application-service", t.application_service),
            ("entity", t.entity),
            ("value-object", t.value_object),
            ("repository", t.repository),
        ] {
            if value == 0 {
                return Err(EngineError::config(format!(
                    "threshold for {role} must be at least 1"
                )));
            }
        }
        if self.cochange.window_secs < 0 {
            return Err(EngineError::config("cochange window-secs must be >= 0"));
        }
        if self.cochange.min_cluster < 2 {
            return Err(EngineError::config("cochange min-cluster must be >= 2"));
        }
        Ok(())
    }
}

/// Load the engine configuration, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, EngineError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::config(format!("cannot read {}: {e}", path.display())))?;

    let config: EngineConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .map_err(|e| EngineError::config(format!("{}: {e}", path.display())))?,
        _ => toml::from_str(&text)
            .map_err(|e| EngineError::config(format!("{}: {e}", path.display())))?,
    };
    config.validate()?;
    debug!("loaded configuration from {}", path.display());
    Ok(config)
}

/// Load the ecosystem-specific marker → role mapping.
///
/// Canonical role names always resolve; the map file adds framework
/// markers on top (e.g. `"rest-controller" = "controller"`). Marker
/// matching is case-insensitive.
pub fn load_marker_map(path: Option<&Path>) -> Result<FxHashMap<String, Role>, EngineError> {
    let mut map = FxHashMap::default();
    let Some(path) = path else {
        return Ok(map);
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::config(format!("cannot read {}: {e}", path.display())))?;

    let raw: FxHashMap<String, String> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .map_err(|e| EngineError::config(format!("{}: {e}", path.display())))?,
        _ => toml::from_str(&text)
            .map_err(|e| EngineError::config(format!("{}: {e}", path.display())))?,
    };

    for (marker, role_name) in raw {
        let role = Role::from_canonical(&role_name).ok_or_else(|| {
            EngineError::config(format!(
                "marker '{marker}' maps to unknown role '{role_name}'"
            ))
        })?;
        map.insert(marker.to_lowercase(), role);
    }
    Ok(map)
}

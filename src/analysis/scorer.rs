//! Cognitive load scorer
//!
//! Pure functions over the structural graph: a method's score is the sum
//! of its contribution points, nothing else. Ceiling enforcement is
//! role-aware: controllers, services, and repositories are checked per
//! method; entities and value objects are checked on the unit aggregate,
//! reflecting that such units legitimately concentrate more behavior.

use crate::config::{Aggregate, RoleThresholds, SeverityConfig};
use crate::models::{Advisory, MethodScore, UnitReport, Violation, ViolationKind};
use crate::source::{Method, Role, StructuralUnit};

/// Methods scoring in this range on an aggregate-ceiling unit trigger a
/// "possibly over-extracted" advisory.
const OVER_EXTRACTED_RANGE: std::ops::RangeInclusive<u32> = 1..=3;

/// Score of a single method: the sum of its contribution points.
pub fn method_score(method: &Method) -> u32 {
    method.contributions.iter().map(|c| c.points()).sum()
}

/// Unit-level aggregate per the configured policy.
pub fn unit_aggregate(unit: &StructuralUnit, policy: Aggregate) -> u32 {
    match policy {
        Aggregate::SumOfMethods => unit.methods.iter().map(method_score).sum(),
        Aggregate::MaxMethod => unit.methods.iter().map(method_score).max().unwrap_or(0),
    }
}

/// Output of scoring one unit against its role ceiling.
pub struct ScoredUnit {
    pub report: UnitReport,
    pub violations: Vec<Violation>,
    pub advisories: Vec<Advisory>,
}

/// Score a unit and enforce its role ceiling.
///
/// A method scoring 0 is valid, never a violation. Unclassified units are
/// scored and reported at info level with no ceiling enforced.
pub fn score_unit(
    unit: &StructuralUnit,
    role: Role,
    thresholds: &RoleThresholds,
    aggregate_policy: Aggregate,
    severities: &SeverityConfig,
) -> ScoredUnit {
    let methods: Vec<MethodScore> = unit
        .methods
        .iter()
        .map(|m| MethodScore {
            method_id: m.id.clone(),
            score: method_score(m),
        })
        .collect();
    let aggregate = unit_aggregate(unit, aggregate_policy);

    let mut violations = Vec::new();
    let mut advisories = Vec::new();

    match thresholds.ceiling(role) {
        None => {
            if aggregate > 0 {
                advisories.push(Advisory::info(
                    &unit.id,
                    format!(
                        "no role marker resolved; aggregate load {aggregate} reported without a ceiling"
                    ),
                ));
            }
        }
        Some(ceiling) if role.uses_aggregate_ceiling() => {
            if aggregate > ceiling {
                violations.push(
                    Violation::new(
                        ViolationKind::OverLoad,
                        &unit.id,
                        severities.over_load,
                        format!(
                            "unit aggregate load {aggregate} exceeds the {role} ceiling of {ceiling}"
                        ),
                    )
                    .with_score(aggregate, ceiling),
                );
            }
            for entry in &methods {
                if OVER_EXTRACTED_RANGE.contains(&entry.score) {
                    advisories.push(
                        Advisory::info(
                            &unit.id,
                            format!(
                                "method '{}' scores {}; possibly over-extracted for a {role}",
                                entry.method_id, entry.score
                            ),
                        )
                        .with_method(&entry.method_id),
                    );
                }
            }
        }
        Some(ceiling) => {
            for entry in &methods {
                if entry.score > ceiling {
                    violations.push(
                        Violation::new(
                            ViolationKind::OverLoad,
                            &unit.id,
                            severities.over_load,
                            format!(
                                "method '{}' scores {} against the {role} ceiling of {ceiling}",
                                entry.method_id, entry.score
                            ),
                        )
                        .with_method(&entry.method_id)
                        .with_score(entry.score, ceiling),
                    );
                }
            }
        }
    }

    ScoredUnit {
        report: UnitReport {
            unit_id: unit.id.clone(),
            role,
            aggregate_score: aggregate,
            methods,
            cohesion_ratio: None,
        },
        violations,
        advisories,
    }
}

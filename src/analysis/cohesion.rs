//! Cohesion analyzer
//!
//! Builds the bipartite usage graph between a unit's collaborator members
//! and its methods, then partitions it into connected components with
//! union-find. The partition is a deterministic graph computation, not a
//! heuristic: each component is one suggested extraction boundary. The
//! record is computed once per unit and shared read-only with the drift
//! detector.

use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashMap;

use crate::models::{Severity, SplitGroup, Violation, ViolationKind};
use crate::source::StructuralUnit;

/// One connected component of the usage graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageComponent {
    pub methods: Vec<String>,
    pub members: Vec<String>,
}

/// Derived cohesion state for one unit. Never mutated; recomputed from
/// the graph on demand.
#[derive(Debug, Clone)]
pub struct CohesionRecord {
    pub unit_id: String,
    /// Collaborator member count (N).
    pub member_count: usize,
    /// Method count (M).
    pub method_count: usize,
    /// Sparse member×method usage matrix: per method, the collaborator
    /// members it references, in unit method order.
    pub usage: Vec<(String, Vec<String>)>,
    /// Mean over methods of (collaborator members referenced / N).
    pub ratio: f64,
    pub components: Vec<UsageComponent>,
}

/// Compute the usage partition for a unit.
///
/// Returns `None` when the unit has no collaborator members or no
/// methods: there is no usage graph to partition. Methods referencing no
/// collaborator member contribute 0 to the ratio and stay out of the
/// partition.
pub fn analyze(unit: &StructuralUnit) -> Option<CohesionRecord> {
    let members = unit.collaborator_members();
    let n = members.len();
    let m = unit.methods.len();
    if n == 0 || m == 0 {
        return None;
    }

    let member_index: FxHashMap<&str, usize> = members
        .iter()
        .enumerate()
        .map(|(i, member)| (member.id.as_str(), i))
        .collect();

    // Vertices 0..m are methods, m..m+n are members.
    let mut dsu = UnionFind::<usize>::new(m + n);
    let mut ratio_sum = 0.0;
    let mut usage: Vec<Vec<&str>> = vec![Vec::new(); m];

    for (mi, method) in unit.methods.iter().enumerate() {
        let used = method.referenced_collaborators(unit);
        ratio_sum += used.len() as f64 / n as f64;
        for member_id in used {
            if let Some(&idx) = member_index.get(member_id) {
                dsu.union(mi, m + idx);
                usage[mi].push(member_id);
            }
        }
    }

    let mut groups: FxHashMap<usize, UsageComponent> = FxHashMap::default();
    for (mi, method) in unit.methods.iter().enumerate() {
        if usage[mi].is_empty() {
            continue;
        }
        let root = dsu.find(mi);
        let group = groups.entry(root).or_insert_with(|| UsageComponent {
            methods: Vec::new(),
            members: Vec::new(),
        });
        group.methods.push(method.id.clone());
        for member_id in &usage[mi] {
            if !group.members.iter().any(|existing| existing == member_id) {
                group.members.push(member_id.to_string());
            }
        }
    }

    let mut components: Vec<UsageComponent> = groups.into_values().collect();
    for component in &mut components {
        component.methods.sort();
        component.methods.dedup();
        component.members.sort();
    }
    components.sort_by(|a, b| a.methods.cmp(&b.methods));

    let matrix: Vec<(String, Vec<String>)> = unit
        .methods
        .iter()
        .enumerate()
        .map(|(mi, method)| {
            let mut used: Vec<String> = usage[mi].iter().map(|s| s.to_string()).collect();
            used.sort();
            (method.id.clone(), used)
        })
        .collect();

    Some(CohesionRecord {
        unit_id: unit.id.clone(),
        member_count: n,
        method_count: m,
        usage: matrix,
        ratio: ratio_sum / m as f64,
        components,
    })
}

/// Flag a unit whose usage graph partitions into disjoint groups or whose
/// cohesion ratio falls below the floor.
pub fn check_low_cohesion(
    record: &CohesionRecord,
    floor: f64,
    severity: Severity,
) -> Option<Violation> {
    let partitioned = record.components.len() >= 2;
    let below_floor = record.ratio < floor;
    if !partitioned && !below_floor {
        return None;
    }

    let message = if partitioned {
        format!(
            "methods partition into {} disjoint member-usage groups (cohesion ratio {:.2})",
            record.components.len(),
            record.ratio
        )
    } else {
        format!(
            "cohesion ratio {:.2} below floor {:.2}",
            record.ratio, floor
        )
    };

    let split: Vec<SplitGroup> = record
        .components
        .iter()
        .map(|c| SplitGroup {
            methods: c.methods.clone(),
            members: c.members.clone(),
        })
        .collect();

    let mut violation = Violation::new(ViolationKind::LowCohesion, &record.unit_id, severity, message);
    if !split.is_empty() {
        violation = violation.with_split(split);
    }
    Some(violation)
}

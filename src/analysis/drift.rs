//! Responsibility drift detector
//!
//! Divergent change reframes the cohesion partition: a unit whose methods
//! split into disjoint responsibility clusters is flagged once per extra
//! cluster beyond the first. Shotgun surgery needs co-change history the
//! structural graph cannot provide; without it that sub-detector is
//! skipped entirely.

use petgraph::unionfind::UnionFind;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::analysis::cohesion::CohesionRecord;
use crate::cochange::CoChangeRecord;
use crate::config::CoChangeConfig;
use crate::models::{Severity, SplitGroup, Violation, ViolationKind};
use crate::source::ModelGraph;

/// Flag each responsibility cluster beyond the unit's first.
pub fn divergent_change(record: &CohesionRecord, severity: Severity) -> Vec<Violation> {
    if record.components.len() < 2 {
        return Vec::new();
    }
    record
        .components
        .iter()
        .skip(1)
        .map(|component| {
            Violation::new(
                ViolationKind::DivergentChange,
                &record.unit_id,
                severity,
                format!(
                    "methods {} form a responsibility cluster disjoint from the unit's primary cluster",
                    component.methods.join(", ")
                ),
            )
            .with_split(vec![SplitGroup {
                methods: component.methods.clone(),
                members: component.members.clone(),
            }])
        })
        .collect()
}

/// Flag clusters of units that co-change frequently without any
/// structural relationship.
///
/// Records naming units absent from the graph are ignored. Unit pairs
/// sharing at least `min_events` change events form edges; a connected
/// cluster of `min_cluster`+ units where no pair is structurally related
/// is scattered.
pub fn shotgun_surgery(
    graph: &ModelGraph,
    records: &[CoChangeRecord],
    config: &CoChangeConfig,
    severity: Severity,
) -> Vec<Violation> {
    let events = crate::cochange::group_events(records, config.window_secs);

    let mut pair_counts: FxHashMap<(String, String), usize> = FxHashMap::default();
    let mut known_units: FxHashSet<String> = FxHashSet::default();
    for event in &events {
        let mut units: Vec<&str> = event
            .iter()
            .filter(|u| {
                let known = graph.contains(u);
                if !known {
                    debug!("co-change record for unknown unit '{u}' ignored");
                }
                known
            })
            .map(String::as_str)
            .collect();
        units.sort_unstable();
        for (i, a) in units.iter().enumerate() {
            for b in &units[i + 1..] {
                *pair_counts
                    .entry((a.to_string(), b.to_string()))
                    .or_insert(0) += 1;
                known_units.insert(a.to_string());
                known_units.insert(b.to_string());
            }
        }
    }

    let mut unit_ids: Vec<String> = known_units.into_iter().collect();
    unit_ids.sort();
    let index: FxHashMap<&str, usize> = unit_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut dsu = UnionFind::<usize>::new(unit_ids.len());
    for ((a, b), count) in &pair_counts {
        if *count >= config.min_events {
            dsu.union(index[a.as_str()], index[b.as_str()]);
        }
    }

    let mut clusters: FxHashMap<usize, Vec<String>> = FxHashMap::default();
    for (i, id) in unit_ids.iter().enumerate() {
        clusters.entry(dsu.find(i)).or_default().push(id.clone());
    }

    let mut scattered: Vec<Vec<String>> = clusters
        .into_values()
        .filter(|cluster| cluster.len() >= config.min_cluster)
        .filter(|cluster| {
            // scattered means no structural relationship between any pair
            !cluster.iter().enumerate().any(|(i, a)| {
                cluster[i + 1..]
                    .iter()
                    .any(|b| graph.structurally_related(a, b))
            })
        })
        .map(|mut cluster| {
            cluster.sort();
            cluster
        })
        .collect();
    scattered.sort();

    scattered
        .into_iter()
        .map(|cluster| {
            let anchor = cluster[0].clone();
            Violation::new(
                ViolationKind::ShotgunSurgery,
                anchor,
                severity,
                format!(
                    "units {} co-change in {}+ coordinated edits but share no structural relationship",
                    cluster.join(", "),
                    config.min_events
                ),
            )
        })
        .collect()
}

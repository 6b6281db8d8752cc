//! Library-level end-to-end tests
//!
//! Drives the full builder → engine → report pipeline through the public
//! API against model files in temp directories, covering the scoring
//! rubric, role policies, and cohesion scenarios.

use std::path::Path;

use cogload::analysis::{roles::RoleClassifier, AnalysisEngine, CancelToken};
use cogload::config::{self, Aggregate, EngineConfig};
use cogload::models::{AnalysisReport, Severity, ViolationKind};
use cogload::source::adapter::JsonModelAdapter;
use cogload::source::builder::SourceModelBuilder;
use cogload::source::Role;

use rustc_hash::FxHashMap;

fn write_model(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

fn analyze_dir(dir: &Path, config: EngineConfig) -> AnalysisReport {
    analyze_dir_with_markers(dir, config, FxHashMap::default())
}

fn analyze_dir_with_markers(
    dir: &Path,
    config: EngineConfig,
    markers: FxHashMap<String, Role>,
) -> AnalysisReport {
    let cancel = CancelToken::new();
    let builder = SourceModelBuilder::new(
        Box::new(JsonModelAdapter::new()),
        config.policies.stream_counting,
    );
    let outcome = builder.build(&[dir.to_path_buf()], &cancel).unwrap();
    AnalysisEngine::new(config, RoleClassifier::new(markers))
        .run(&outcome.graph, None, outcome.skipped, &cancel)
        .unwrap()
}

#[test]
fn repository_method_over_five_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "repo.json",
        r#"{"units": [{
            "id": "shop.OrderRepository",
            "markers": ["repository"],
            "members": [{"id": "db", "type": "shop.Database"}],
            "methods": [{
                "id": "findStale",
                "reads": ["db"],
                "body": [
                    {"kind": "branch"}, {"kind": "branch"},
                    {"kind": "loop"}, {"kind": "try"}, {"kind": "catch"}
                ]
            }]
        }]}"#,
    );

    // 1 collaborator + 2 branches + loop + try + catch = 6 > 5
    let report = analyze_dir(dir.path(), EngineConfig::default());
    let overloads: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::OverLoad)
        .collect();
    assert_eq!(overloads.len(), 1);
    assert_eq!(overloads[0].severity, Severity::Error);
    assert_eq!(overloads[0].score, Some(6));
    assert_eq!(overloads[0].threshold, Some(5));
    assert!(!report.clean);
}

#[test]
fn doubly_nested_branch_costs_two_extra() {
    let dir = tempfile::tempdir().unwrap();
    // branch(1) > branch(2) > branch(2): total 5
    write_model(
        dir.path(),
        "nested.json",
        r#"{"units": [{
            "id": "shop.Nested",
            "members": [],
            "methods": [{
                "id": "deep",
                "body": [{"kind": "branch", "children": [
                    {"kind": "branch", "children": [{"kind": "branch"}]}
                ]}]
            }]
        }]}"#,
    );

    let report = analyze_dir(dir.path(), EngineConfig::default());
    assert_eq!(report.units[0].methods[0].score, 5);
}

#[test]
fn fully_cohesive_unit_has_ratio_one_and_no_violation() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "cohesive.json",
        r#"{"units": [{
            "id": "shop.Checkout",
            "members": [
                {"id": "cart", "type": "shop.Cart"},
                {"id": "payment", "type": "shop.Payment"},
                {"id": "shipping", "type": "shop.Shipping"}
            ],
            "methods": [
                {"id": "submit", "reads": ["cart", "payment", "shipping"]},
                {"id": "preview", "reads": ["cart", "payment", "shipping"]}
            ]
        }]}"#,
    );

    let report = analyze_dir(dir.path(), EngineConfig::default());
    assert_eq!(report.units[0].cohesion_ratio, Some(1.0));
    assert!(report
        .violations
        .iter()
        .all(|v| v.kind != ViolationKind::LowCohesion));
}

#[test]
fn entity_aggregation_policy_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    // two methods scoring 5 each: sum 10 breaches the entity ceiling of
    // 9, max 5 does not
    let model = r#"{"units": [{
        "id": "shop.Order",
        "markers": ["entity"],
        "members": [],
        "methods": [
            {"id": "a", "body": [{"kind": "branch"}, {"kind": "branch"}, {"kind": "branch"}, {"kind": "branch"}, {"kind": "branch"}]},
            {"id": "b", "body": [{"kind": "branch"}, {"kind": "branch"}, {"kind": "branch"}, {"kind": "branch"}, {"kind": "branch"}]}
        ]
    }]}"#;
    write_model(dir.path(), "order.json", model);

    let sum_report = analyze_dir(dir.path(), EngineConfig::default());
    assert!(sum_report
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::OverLoad && v.score == Some(10)));

    let mut max_config = EngineConfig::default();
    max_config.policies.aggregate = Aggregate::MaxMethod;
    let max_report = analyze_dir(dir.path(), max_config);
    assert!(max_report
        .violations
        .iter()
        .all(|v| v.kind != ViolationKind::OverLoad));
}

#[test]
fn marker_map_file_resolves_ecosystem_markers() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "svc.json",
        r#"{"units": [{
            "id": "shop.PricingBean",
            "markers": ["Stateless"],
            "members": [],
            "methods": [{"id": "quote", "body": [{"kind": "branch"}]}]
        }]}"#,
    );
    let map_path = dir.path().join("markers.json");
    std::fs::write(&map_path, r#"{"stateless": "application-service"}"#).unwrap();
    let markers = config::load_marker_map(Some(&map_path)).unwrap();

    let report = analyze_dir_with_markers(dir.path(), EngineConfig::default(), markers);
    assert_eq!(report.units[0].role, Role::ApplicationService);
}

#[test]
fn ambiguous_markers_warn_and_stay_unclassified() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "odd.json",
        r#"{"units": [{
            "id": "shop.Oddity",
            "markers": ["entity", "repository"],
            "members": [],
            "methods": [{"id": "noop"}]
        }]}"#,
    );

    let report = analyze_dir(dir.path(), EngineConfig::default());
    assert_eq!(report.units[0].role, Role::Unclassified);
    assert!(report
        .advisories
        .iter()
        .any(|a| a.severity == Severity::Warning && a.message.contains("conflicting")));
    assert!(report.clean);
}

#[test]
fn zero_score_methods_are_valid() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "empty.json",
        r#"{"units": [{
            "id": "shop.Marker",
            "markers": ["value-object"],
            "members": [],
            "methods": [{"id": "noop"}]
        }]}"#,
    );

    let report = analyze_dir(dir.path(), EngineConfig::default());
    assert_eq!(report.units[0].methods[0].score, 0);
    assert!(report.violations.is_empty());
    // score 0 is below the over-extraction advisory range
    assert!(report.advisories.is_empty());
    assert!(report.clean);
}

#[test]
fn stream_counting_policy_changes_scores() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "stream.json",
        r#"{"units": [{
            "id": "shop.Report",
            "members": [],
            "methods": [{"id": "render", "body": [{"kind": "stream", "stages": 4}]}]
        }]}"#,
    );

    let per_stage = analyze_dir(dir.path(), EngineConfig::default());
    assert_eq!(per_stage.units[0].methods[0].score, 4);

    let mut chain_config = EngineConfig::default();
    chain_config.policies.stream_counting = config::StreamCounting::WholeChain;
    let whole_chain = analyze_dir(dir.path(), chain_config);
    assert_eq!(whole_chain.units[0].methods[0].score, 1);
}

#[test]
fn invariant_violation_excludes_only_that_unit() {
    let dir = tempfile::tempdir().unwrap();
    write_model(
        dir.path(),
        "mixed.json",
        r#"{"units": [
            {"id": "shop.Good", "members": [], "methods": [{"id": "ok"}]},
            {"id": "shop.Bad", "members": [], "methods": [{"id": "broken", "reads": ["ghost"]}]}
        ]}"#,
    );

    let report = analyze_dir(dir.path(), EngineConfig::default());
    assert_eq!(report.units.len(), 1);
    assert_eq!(report.units[0].unit_id, "shop.Good");
    assert_eq!(report.skipped_units.len(), 1);
    assert_eq!(report.skipped_units[0].source, "shop.Bad");
}

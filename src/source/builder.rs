//! Source model builder
//!
//! Turns raw input (directories or file lists) into the normalized
//! structural graph. Parsing is embarrassingly parallel at file
//! granularity: each file is parsed by an independent rayon task writing
//! only to an append-only result collector. Unparseable units become
//! skipped-unit records attached to the final report, not run-aborting
//! failures.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::analysis::CancelToken;
use crate::config::StreamCounting;
use crate::errors::EngineError;
use crate::models::{SkipReason, SkippedUnit};
use crate::source::adapter::{FragmentKind, FrontEndAdapter, RawFragment, RawMethod, RawUnit};
use crate::source::{
    ContributionCategory, LoadContribution, Member, Method, ModelGraph, Role, StructuralUnit,
};

/// Progress callback: (files done, files total).
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Simple type names that never count as collaborators.
const STANDARD_TYPES: &[&str] = &[
    "void", "bool", "boolean", "int", "integer", "long", "short", "byte", "char", "float",
    "double", "number", "decimal", "bigdecimal", "biginteger", "string", "str", "object", "any",
    "uuid", "date", "datetime", "instant", "duration", "localdate", "localdatetime",
];

/// Standard container names; their payload types arrive as separate
/// member descriptors when the front-end considers them collaborators.
const STANDARD_CONTAINERS: &[&str] = &[
    "list", "map", "set", "optional", "collection", "iterable", "iterator", "array", "vec",
    "hashmap", "hashset", "btreemap", "dictionary", "queue", "deque", "stream", "future",
    "completablefuture",
];

/// Namespace prefixes of platform/standard libraries.
const STANDARD_PREFIXES: &[&str] = &[
    "java.", "javax.", "jakarta.", "kotlin.", "scala.", "std::", "core::", "alloc::", "system.",
];

/// Builds the structural graph through a front-end adapter.
pub struct SourceModelBuilder {
    adapter: Box<dyn FrontEndAdapter>,
    stream_counting: StreamCounting,
    workers: usize,
    progress: Option<ProgressCallback>,
}

/// Result of one build: the immutable graph plus everything that was
/// skipped on the way.
pub struct BuildOutcome {
    pub graph: ModelGraph,
    pub skipped: Vec<SkippedUnit>,
    pub cancelled: bool,
}

impl BuildOutcome {
    /// Whether any skip was caused by an unreadable or malformed source.
    pub fn has_parse_failures(&self) -> bool {
        self.skipped
            .iter()
            .any(|s| s.reason == SkipReason::ParseError)
    }
}

impl SourceModelBuilder {
    pub fn new(adapter: Box<dyn FrontEndAdapter>, stream_counting: StreamCounting) -> Self {
        Self {
            adapter,
            stream_counting,
            workers: 0,
            progress: None,
        }
    }

    /// Number of parallel parse workers (0 = rayon default).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Expand positional paths into the list of parseable files.
    ///
    /// Directories are walked gitignore-aware; a path that does not exist
    /// is an invocation error, not a skipped unit.
    pub fn collect_files(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in paths {
            if !path.exists() {
                bail!("input path does not exist: {}", path.display());
            }
            if path.is_file() {
                if self.adapter.can_parse(path) {
                    files.push(path.clone());
                } else {
                    warn!("ignoring {}: not a model file", path.display());
                }
                continue;
            }
            for entry in ignore::WalkBuilder::new(path).build() {
                let entry = entry.with_context(|| format!("walking {}", path.display()))?;
                let p = entry.path();
                if entry.file_type().is_some_and(|t| t.is_file()) && self.adapter.can_parse(p) {
                    files.push(p.to_path_buf());
                }
            }
        }
        // Deterministic parse order regardless of walk order
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Parse all files and assemble the structural graph.
    ///
    /// Per-file failures accumulate as skipped units; only unusable input
    /// paths or a broken thread pool abort the build.
    pub fn build(&self, paths: &[PathBuf], cancel: &CancelToken) -> Result<BuildOutcome> {
        let files = self.collect_files(paths)?;
        info!(
            "parsing {} file(s) with adapter '{}'",
            files.len(),
            self.adapter.name()
        );

        enum FileOutcome {
            Parsed(PathBuf, Vec<RawUnit>),
            Skipped(SkippedUnit),
            Cancelled,
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .context("building parse thread pool")?;

        let done = AtomicUsize::new(0);
        let total = files.len();
        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    if cancel.is_cancelled() {
                        return FileOutcome::Cancelled;
                    }
                    let outcome = match std::fs::read_to_string(file) {
                        Ok(text) => match self.adapter.parse(file, &text) {
                            Ok(units) => FileOutcome::Parsed(file.clone(), units),
                            Err(e) => FileOutcome::Skipped(SkippedUnit {
                                source: file.display().to_string(),
                                reason: SkipReason::ParseError,
                                message: e.to_string(),
                            }),
                        },
                        Err(e) => FileOutcome::Skipped(SkippedUnit {
                            source: file.display().to_string(),
                            reason: SkipReason::ParseError,
                            message: format!("unreadable source: {e}"),
                        }),
                    };
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref cb) = self.progress {
                        cb(finished, total);
                    }
                    outcome
                })
                .collect()
        });

        let mut skipped = Vec::new();
        let mut cancelled = false;
        let mut units = Vec::new();
        let mut seen_ids = FxHashSet::default();

        for outcome in outcomes {
            match outcome {
                FileOutcome::Cancelled => cancelled = true,
                FileOutcome::Skipped(skip) => skipped.push(skip),
                FileOutcome::Parsed(file, raw_units) => {
                    for raw in raw_units {
                        if !seen_ids.insert(raw.id.clone()) {
                            skipped.push(SkippedUnit {
                                source: raw.id.clone(),
                                reason: SkipReason::InvariantViolation,
                                message: format!(
                                    "duplicate unit id '{}' (second definition in {})",
                                    raw.id,
                                    file.display()
                                ),
                            });
                            continue;
                        }
                        match self.normalize_unit(raw, &file) {
                            Ok(unit) => units.push(unit),
                            Err(e) => {
                                let source = match &e {
                                    EngineError::Invariant { unit_id, .. } => unit_id.clone(),
                                    _ => file.display().to_string(),
                                };
                                skipped.push(SkippedUnit {
                                    source,
                                    reason: SkipReason::InvariantViolation,
                                    message: e.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "built graph: {} unit(s), {} skipped, cancelled={}",
            units.len(),
            skipped.len(),
            cancelled
        );
        Ok(BuildOutcome {
            graph: ModelGraph::new(units),
            skipped,
            cancelled,
        })
    }

    /// Normalize one raw unit, enforcing per-unit invariants.
    fn normalize_unit(&self, raw: RawUnit, file: &Path) -> Result<StructuralUnit, EngineError> {
        let mut member_ids = FxHashSet::default();
        let mut members = Vec::with_capacity(raw.members.len());
        for m in raw.members {
            if !member_ids.insert(m.id.clone()) {
                return Err(EngineError::invariant(
                    &raw.id,
                    format!("duplicate member id '{}'", m.id),
                ));
            }
            let is_collaborator = m
                .collaborator
                .unwrap_or_else(|| !is_standard_type(&m.type_name));
            members.push(Member {
                id: m.id,
                type_name: m.type_name,
                is_collaborator,
            });
        }

        let mut method_ids = FxHashSet::default();
        let mut methods = Vec::with_capacity(raw.methods.len());
        for m in &raw.methods {
            if !method_ids.insert(m.id.clone()) {
                return Err(EngineError::invariant(
                    &raw.id,
                    format!("duplicate method id '{}'", m.id),
                ));
            }
            methods.push(self.normalize_method(&raw.id, m, &members)?);
        }

        Ok(StructuralUnit {
            id: raw.id,
            role: Role::Unclassified,
            markers: raw.markers,
            members,
            methods,
            source_path: file.display().to_string(),
        })
    }

    fn normalize_method(
        &self,
        unit_id: &str,
        raw: &RawMethod,
        members: &[Member],
    ) -> Result<Method, EngineError> {
        let mut referenced: Vec<String> = raw.reads.clone();
        referenced.sort();
        referenced.dedup();
        for member_id in &referenced {
            if !members.iter().any(|m| &m.id == member_id) {
                return Err(EngineError::invariant(
                    unit_id,
                    format!(
                        "method '{}' references member '{}' absent from its unit",
                        raw.id, member_id
                    ),
                ));
            }
        }

        // Each unique collaborator-type member counts once per method,
        // regardless of call-site count.
        let mut contributions: Vec<LoadContribution> = referenced
            .iter()
            .filter(|id| members.iter().any(|m| &m.id == *id && m.is_collaborator))
            .map(|_| LoadContribution::new(ContributionCategory::CollaboratorReference, false))
            .collect();
        walk_fragments(&raw.body, false, self.stream_counting, &mut contributions);

        let mut called: Vec<String> = raw.calls.clone();
        called.sort();
        called.dedup();

        Ok(Method {
            id: raw.id.clone(),
            unit_id: unit_id.to_string(),
            referenced_members: referenced,
            contributions,
            called_units: called,
        })
    }
}

/// Classify a type descriptor as standard (primitive/platform) vs. custom.
fn is_standard_type(type_name: &str) -> bool {
    let base = type_name.split('<').next().unwrap_or(type_name).trim();
    let lower = base.to_lowercase();
    if STANDARD_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    let simple = lower.rsplit(['.', ':']).next().unwrap_or(lower.as_str());
    STANDARD_TYPES.contains(&simple) || STANDARD_CONTAINERS.contains(&simple)
}

/// Flatten a body fragment tree into load contributions.
///
/// A branch nested inside another branch or loop costs one extra point;
/// loops, try and catch blocks get the same nesting add-on. Branches and
/// loops open a nesting context for their children; try/catch/lambda/
/// stream propagate the context they inherited.
fn walk_fragments(
    fragments: &[RawFragment],
    in_branch_or_loop: bool,
    stream_counting: StreamCounting,
    out: &mut Vec<LoadContribution>,
) {
    for frag in fragments {
        match frag.kind {
            FragmentKind::Branch => {
                let category = if in_branch_or_loop {
                    ContributionCategory::NestedBranch
                } else {
                    ContributionCategory::Branch
                };
                out.push(LoadContribution::new(category, in_branch_or_loop));
                walk_fragments(&frag.children, true, stream_counting, out);
            }
            FragmentKind::Loop => {
                out.push(LoadContribution::new(
                    ContributionCategory::Loop,
                    in_branch_or_loop,
                ));
                walk_fragments(&frag.children, true, stream_counting, out);
            }
            FragmentKind::Try => {
                out.push(LoadContribution::new(
                    ContributionCategory::Try,
                    in_branch_or_loop,
                ));
                walk_fragments(&frag.children, in_branch_or_loop, stream_counting, out);
            }
            FragmentKind::Catch => {
                out.push(LoadContribution::new(
                    ContributionCategory::Catch,
                    in_branch_or_loop,
                ));
                walk_fragments(&frag.children, in_branch_or_loop, stream_counting, out);
            }
            FragmentKind::Lambda => {
                out.push(LoadContribution::new(ContributionCategory::Lambda, false));
                walk_fragments(&frag.children, in_branch_or_loop, stream_counting, out);
            }
            FragmentKind::Stream => {
                let stages = match stream_counting {
                    StreamCounting::PerStage => frag.stages.unwrap_or(1).max(1),
                    StreamCounting::WholeChain => 1,
                };
                for _ in 0..stages {
                    out.push(LoadContribution::new(
                        ContributionCategory::StreamStage,
                        false,
                    ));
                }
                walk_fragments(&frag.children, in_branch_or_loop, stream_counting, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::adapter::JsonModelAdapter;
    use std::io::Write;

    fn builder() -> SourceModelBuilder {
        SourceModelBuilder::new(Box::new(JsonModelAdapter::new()), StreamCounting::PerStage)
    }

    fn write_model(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn standard_type_classification() {
        assert!(is_standard_type("int"));
        assert!(is_standard_type("String"));
        assert!(is_standard_type("java.util.List"));
        assert!(is_standard_type("List<Order>"));
        assert!(is_standard_type("std::vec::Vec"));
        assert!(!is_standard_type("com.shop.OrderService"));
        assert!(!is_standard_type("PaymentGateway"));
    }

    #[test]
    fn nested_branch_costs_two() {
        let frags = vec![RawFragment {
            kind: FragmentKind::Branch,
            children: vec![RawFragment {
                kind: FragmentKind::Branch,
                children: vec![],
                stages: None,
            }],
            stages: None,
        }];
        let mut out = Vec::new();
        walk_fragments(&frags, false, StreamCounting::PerStage, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].points(), 1);
        assert_eq!(out[1].category, ContributionCategory::NestedBranch);
        assert_eq!(out[1].points(), 2);
    }

    #[test]
    fn loop_inside_branch_gets_nesting_addon() {
        let frags = vec![RawFragment {
            kind: FragmentKind::Branch,
            children: vec![RawFragment {
                kind: FragmentKind::Loop,
                children: vec![],
                stages: None,
            }],
            stages: None,
        }];
        let mut out = Vec::new();
        walk_fragments(&frags, false, StreamCounting::PerStage, &mut out);
        assert_eq!(out[1].category, ContributionCategory::Loop);
        assert_eq!(out[1].points(), 2);
    }

    #[test]
    fn try_does_not_open_nesting_context() {
        let frags = vec![RawFragment {
            kind: FragmentKind::Try,
            children: vec![RawFragment {
                kind: FragmentKind::Branch,
                children: vec![],
                stages: None,
            }],
            stages: None,
        }];
        let mut out = Vec::new();
        walk_fragments(&frags, false, StreamCounting::PerStage, &mut out);
        // branch inside try but not inside a branch/loop: flat cost
        assert_eq!(out[1].category, ContributionCategory::Branch);
        assert_eq!(out[1].points(), 1);
    }

    #[test]
    fn stream_stage_policies() {
        let frags = vec![RawFragment {
            kind: FragmentKind::Stream,
            children: vec![],
            stages: Some(3),
        }];

        let mut per_stage = Vec::new();
        walk_fragments(&frags, false, StreamCounting::PerStage, &mut per_stage);
        assert_eq!(per_stage.len(), 3);

        let mut whole = Vec::new();
        walk_fragments(&frags, false, StreamCounting::WholeChain, &mut whole);
        assert_eq!(whole.len(), 1);
    }

    #[test]
    fn build_skips_malformed_file_and_keeps_good_units() {
        let dir = tempfile::tempdir().unwrap();
        write_model(
            dir.path(),
            "good.json",
            r#"{"units": [{"id": "A", "members": [], "methods": []}]}"#,
        );
        write_model(dir.path(), "bad.json", "not json at all");

        let outcome = builder()
            .build(&[dir.path().to_path_buf()], &CancelToken::new())
            .unwrap();
        assert_eq!(outcome.graph.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::ParseError);
        assert!(outcome.has_parse_failures());
        assert!(!outcome.cancelled);
    }

    #[test]
    fn unknown_member_reference_is_invariant_violation() {
        let dir = tempfile::tempdir().unwrap();
        write_model(
            dir.path(),
            "model.json",
            r#"{"units": [{
                "id": "Broken",
                "members": [{"id": "a", "type": "X"}],
                "methods": [{"id": "go", "reads": ["ghost"]}]
            }]}"#,
        );

        let outcome = builder()
            .build(&[dir.path().to_path_buf()], &CancelToken::new())
            .unwrap();
        assert!(outcome.graph.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::InvariantViolation);
        assert_eq!(outcome.skipped[0].source, "Broken");
    }

    #[test]
    fn duplicate_unit_ids_skip_later_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_model(
            dir.path(),
            "a.json",
            r#"{"units": [{"id": "Dup", "members": [], "methods": []}]}"#,
        );
        write_model(
            dir.path(),
            "b.json",
            r#"{"units": [{"id": "Dup", "members": [], "methods": []}]}"#,
        );

        let outcome = builder()
            .build(&[dir.path().to_path_buf()], &CancelToken::new())
            .unwrap();
        assert_eq!(outcome.graph.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::InvariantViolation);
    }

    #[test]
    fn collaborator_reference_counted_once_per_method() {
        let dir = tempfile::tempdir().unwrap();
        write_model(
            dir.path(),
            "model.json",
            r#"{"units": [{
                "id": "svc.Checkout",
                "members": [
                    {"id": "gateway", "type": "pay.Gateway"},
                    {"id": "count", "type": "int"}
                ],
                "methods": [{"id": "pay", "reads": ["gateway", "gateway", "count"]}]
            }]}"#,
        );

        let outcome = builder()
            .build(&[dir.path().to_path_buf()], &CancelToken::new())
            .unwrap();
        let unit = outcome.graph.get("svc.Checkout").unwrap();
        let method = &unit.methods[0];
        // one collaborator contribution for gateway, none for the int
        assert_eq!(method.contributions.len(), 1);
        assert_eq!(
            method.contributions[0].category,
            ContributionCategory::CollaboratorReference
        );
    }

    #[test]
    fn cancelled_build_reports_partial_status() {
        let dir = tempfile::tempdir().unwrap();
        write_model(
            dir.path(),
            "model.json",
            r#"{"units": [{"id": "A", "members": [], "methods": []}]}"#,
        );

        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = builder()
            .build(&[dir.path().to_path_buf()], &cancel)
            .unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.graph.is_empty());
    }
}

//! Analysis engine with parallel per-unit execution
//!
//! Once the structural graph is assembled (the build barrier), scoring,
//! role classification, and cohesion analysis run concurrently per unit:
//! none of them needs cross-unit data. Results flow through an append-only
//! channel; deterministic report order is restored by the final sort, not
//! by insertion order. The shotgun-surgery path is the only second
//! barrier: it waits for all per-unit partitions plus the optional
//! co-change history.

pub mod cohesion;
pub mod drift;
pub mod roles;
pub mod scorer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cochange::CoChangeRecord;
use crate::config::EngineConfig;
use crate::models::{
    Advisory, AnalysisReport, RunStatus, Severity, SkippedUnit, UnitReport, Violation,
    ViolationsSummary,
};
use crate::source::{ModelGraph, StructuralUnit};
use self::roles::RoleClassifier;

/// Cooperative cancellation signal shared across tasks.
///
/// In-flight work observes the token between units and returns a partial
/// result with a cancelled status rather than truncating silently.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one per-unit task produces.
struct UnitOutcome {
    report: UnitReport,
    violations: Vec<Violation>,
    advisories: Vec<Advisory>,
}

/// Runs all per-unit analyses and the drift detector over one graph.
pub struct AnalysisEngine {
    config: EngineConfig,
    classifier: RoleClassifier,
    workers: usize,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig, classifier: RoleClassifier) -> Self {
        Self {
            config,
            classifier,
            workers: 0,
        }
    }

    /// Number of worker threads (0 = rayon default).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// The severity at/above which the run stops being clean.
    pub fn severity_threshold(&self) -> Severity {
        self.config.severity_threshold.unwrap_or(Severity::Error)
    }

    /// Analyze a complete graph.
    ///
    /// `skipped` carries build-time skip records through to the report;
    /// `cochange` is the optional external co-change history; when
    /// absent, the shotgun-surgery sub-detector is skipped entirely.
    pub fn run(
        &self,
        graph: &ModelGraph,
        cochange: Option<&[CoChangeRecord]>,
        skipped: Vec<SkippedUnit>,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport> {
        info!("analyzing {} unit(s)", graph.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .context("building analysis thread pool")?;

        // Concurrency-safe append-only accumulator; ordering is restored
        // by the deterministic sort in finalize().
        let (sender, receiver) = crossbeam_channel::unbounded::<UnitOutcome>();
        let cancelled = AtomicBool::new(cancel.is_cancelled());

        pool.install(|| {
            graph.units().par_iter().for_each_with(sender, |tx, unit| {
                if cancel.is_cancelled() {
                    cancelled.store(true, Ordering::SeqCst);
                    return;
                }
                // send only fails when the receiver is gone, i.e. the
                // run is being torn down
                let _ = tx.send(self.analyze_unit(unit));
            });
        });

        let mut violations = Vec::new();
        let mut advisories = Vec::new();
        let mut units = Vec::new();
        for outcome in receiver.iter() {
            violations.extend(outcome.violations);
            advisories.extend(outcome.advisories);
            units.push(outcome.report);
        }

        let was_cancelled = cancelled.load(Ordering::SeqCst) || cancel.is_cancelled();

        // Second barrier: shotgun surgery needs every per-unit partition
        // plus the external history. Skipped on cancellation or when no
        // co-change source was supplied.
        match cochange {
            Some(records) if !was_cancelled => {
                let found = drift::shotgun_surgery(
                    graph,
                    records,
                    &self.config.cochange,
                    self.config.severities.shotgun_surgery,
                );
                debug!("shotgun surgery: {} cluster(s) flagged", found.len());
                violations.extend(found);
            }
            Some(_) => debug!("cancelled before shotgun surgery; sub-detector skipped"),
            None => debug!("no co-change source; shotgun surgery skipped"),
        }

        let report = AnalysisReport {
            status: if was_cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Complete
            },
            clean: true,
            severity_threshold: self.severity_threshold(),
            summary: ViolationsSummary::default(),
            violations,
            advisories,
            skipped_units: skipped,
            units,
        };
        Ok(report.finalize())
    }

    /// Score, classify, and partition one unit. Pure over the shared
    /// read-only graph; no cross-unit coordination.
    fn analyze_unit(&self, unit: &StructuralUnit) -> UnitOutcome {
        let classification = self.classifier.classify(unit);
        let mut scored = scorer::score_unit(
            unit,
            classification.role,
            &self.config.thresholds,
            self.config.policies.aggregate,
            &self.config.severities,
        );
        if let Some(message) = classification.ambiguity {
            scored
                .advisories
                .push(Advisory::warning(&unit.id, message));
        }

        if let Some(partition) = cohesion::analyze(unit) {
            scored.report.cohesion_ratio = Some(partition.ratio);
            if let Some(violation) = cohesion::check_low_cohesion(
                &partition,
                self.config.cohesion.floor,
                self.config.severities.low_cohesion,
            ) {
                scored.violations.push(violation);
            }
            // The drift detector reuses the same partition read-only;
            // the usage graph is computed once per unit.
            scored.violations.extend(drift::divergent_change(
                &partition,
                self.config.severities.divergent_change,
            ));
        }

        UnitOutcome {
            report: scored.report,
            violations: scored.violations,
            advisories: scored.advisories,
        }
    }
}

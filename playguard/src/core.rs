//! Core validation logic shared by the editing client, the server-side
//! acceptance path and the CLI.
//!
//! A pass builds the design graph, runs connectivity once, evaluates every
//! rule in category order and aggregates the findings. The engine holds no
//! mutable state, so one instance can serve concurrent callers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::{OverlapPolicy, ValidationOptions};
use crate::design::Design;
use crate::error::{MalformedDesignError, PlayguardError};
use crate::graph::{ConnectivityAnalyzer, DesignGraph};
use crate::rules::{codes, RuleCategory, RuleContext, RuleRegistry, Severity, ValidationRuleResult};

/// Findings of one validation pass, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    /// The design could not be turned into a graph; `results` holds the
    /// single corruption finding.
    pub malformed: bool,
    pub results: Vec<ValidationRuleResult>,
    pub stats: ValidationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub errors: usize,
    pub warnings: usize,
    pub structural: usize,
    pub compatibility: usize,
    pub safety: usize,
}

impl ValidationReport {
    fn from_results(results: Vec<ValidationRuleResult>, malformed: bool) -> Self {
        let stats = results_to_stats(&results);
        Self {
            valid: stats.errors == 0,
            malformed,
            results,
            stats,
        }
    }

    /// Report carrying only the corruption finding for a malformed design.
    pub fn from_malformed(err: &MalformedDesignError) -> Self {
        let finding = ValidationRuleResult::new(
            Severity::Error,
            codes::MALFORMED_DESIGN,
            err.to_string(),
            err.instance_ids(),
            RuleCategory::Structural,
            codes::MALFORMED_DESIGN,
        );
        Self::from_results(vec![finding], true)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationRuleResult> {
        self.results.iter().filter(|r| r.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationRuleResult> {
        self.results.iter().filter(|r| r.severity == Severity::Warning)
    }

    pub fn by_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ValidationRuleResult> {
        self.results.iter().filter(move |r| r.code == code)
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

fn results_to_stats(results: &[ValidationRuleResult]) -> ValidationStats {
    let mut stats = ValidationStats::default();
    for r in results {
        match r.severity {
            Severity::Error => stats.errors += 1,
            Severity::Warning => stats.warnings += 1,
        }
        match r.category {
            RuleCategory::Structural => stats.structural += 1,
            RuleCategory::Compatibility => stats.compatibility += 1,
            RuleCategory::Safety => stats.safety += 1,
        }
    }
    stats
}

type DedupKey = (String, Vec<String>, Option<String>);

/// Merge findings sharing a [`dedup_key`](ValidationRuleResult::dedup_key),
/// keeping the first occurrence in place. A merged entry is an error if any
/// duplicate was.
pub fn deduplicate(results: Vec<ValidationRuleResult>) -> Vec<ValidationRuleResult> {
    let mut positions: HashMap<DedupKey, usize> = HashMap::new();
    let mut merged: Vec<ValidationRuleResult> = Vec::with_capacity(results.len());

    for result in results {
        let (code, ids, rule) = result.dedup_key();
        let key = (code.to_string(), ids.to_vec(), rule.map(str::to_string));
        match positions.get(&key) {
            Some(&pos) => {
                if result.is_error() {
                    merged[pos].severity = Severity::Error;
                }
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(result);
            }
        }
    }

    merged
}

/// Drop findings whose instance set already carries an error from an
/// earlier category.
fn prefer_earliest_category(results: Vec<ValidationRuleResult>) -> Vec<ValidationRuleResult> {
    let mut kept: Vec<ValidationRuleResult> = Vec::with_capacity(results.len());
    for result in results {
        let covered = kept.iter().any(|k| {
            k.is_error()
                && k.category.rank() < result.category.rank()
                && k.instance_ids == result.instance_ids
        });
        if !covered {
            kept.push(result);
        }
    }
    kept
}

pub fn aggregate(
    results: Vec<ValidationRuleResult>,
    policy: OverlapPolicy,
) -> Vec<ValidationRuleResult> {
    let deduped = deduplicate(results);
    match policy {
        OverlapPolicy::ReportAll => deduped,
        OverlapPolicy::PreferEarliestCategory => prefer_earliest_category(deduped),
    }
}

/// The design validation engine.
#[derive(Clone)]
pub struct ValidationEngine {
    registry: Arc<RuleRegistry>,
    options: ValidationOptions,
}

impl ValidationEngine {
    pub fn new(registry: Arc<RuleRegistry>, options: ValidationOptions) -> Self {
        Self { registry, options }
    }

    /// Built-in rules with the given options.
    pub fn with_options(options: ValidationOptions) -> Self {
        Self::new(Arc::new(RuleRegistry::with_default_rules()), options)
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Run a full pass. A malformed design aborts before any rule runs and
    /// yields no partial results.
    pub fn validate(
        &self,
        design: &Design,
        catalog: &Catalog,
    ) -> Result<ValidationReport, MalformedDesignError> {
        let graph = DesignGraph::build(design, catalog).map_err(|e| {
            tracing::warn!("Rejecting malformed design: {}", e);
            e
        })?;
        let connectivity = ConnectivityAnalyzer::analyze(design, catalog, &graph);
        let ctx = RuleContext::new(design, catalog, &graph, &connectivity, &self.options);

        let raw = self.registry.evaluate(&ctx);
        let raw_count = raw.len();
        let results = aggregate(raw, self.options.overlap_policy);
        tracing::debug!(
            "Validation produced {} findings ({} before aggregation)",
            results.len(),
            raw_count
        );

        Ok(ValidationReport::from_results(results, false))
    }

    /// Like [`validate`](Self::validate), but folds a malformed design into
    /// a report with a single `MALFORMED_DESIGN` error.
    pub fn validate_or_report(&self, design: &Design, catalog: &Catalog) -> ValidationReport {
        match self.validate(design, catalog) {
            Ok(report) => report,
            Err(e) => ValidationReport::from_malformed(&e),
        }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_options(ValidationOptions::default())
    }
}

/// File-based entry points used by the CLI and the demo programs.
pub struct PlayguardCore;

impl PlayguardCore {
    pub fn load_design(path: &Path) -> Result<Design, PlayguardError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Design::from_json_str(&content)?)
    }

    pub fn load_catalog(path: &Path) -> Result<Catalog, PlayguardError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Catalog::from_json_str(&content)?)
    }

    /// Validate a design file against a catalog file.
    pub fn validate_files(
        design_path: &Path,
        catalog_path: &Path,
        options: ValidationOptions,
    ) -> Result<ValidationReport, PlayguardError> {
        let design = Self::load_design(design_path)?;
        let catalog = Self::load_catalog(catalog_path)?;
        let engine = ValidationEngine::with_options(options);
        Ok(engine.validate_or_report(&design, &catalog))
    }
}

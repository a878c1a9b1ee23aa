//! Validation Rules
//!
//! A rule is a pure function over an immutable design snapshot, tagged with a
//! category and the severity it produces. Rules never throw domain findings:
//! they return them as [`ValidationRuleResult`] entries. A rule that cannot
//! finish returns a [`RuleError`], which the registry turns into a finding.

pub mod compatibility;
pub mod registry;
pub mod safety;
pub mod structural;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::ValidationOptions;
use crate::design::{Design, PlacedComponent};
use crate::error::RuleError;
use crate::graph::{ConnectivityResult, DesignGraph};

pub use compatibility::{IncompatibleComponentsRule, PartialCompatibilityRule};
pub use registry::{RuleRegistry, RuleRegistryBuilder};
pub use safety::{AgeRangeRule, CapacityRule, MinSpacingRule};
pub use structural::{
    ConnectionPointOccupancyRule, ConnectionTypeRule, DeckHeightRule, DisconnectedComponentRule,
};

/// Codes for findings the engine itself synthesizes.
pub mod codes {
    pub const INTERNAL_RULE_FAILURE: &str = "INTERNAL_RULE_FAILURE";
    pub const UNKNOWN_COMPONENT: &str = "UNKNOWN_COMPONENT";
    pub const MALFORMED_DESIGN: &str = "MALFORMED_DESIGN";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Rule categories, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Structural,
    Compatibility,
    Safety,
}

impl RuleCategory {
    pub const ORDER: [RuleCategory; 3] = [
        RuleCategory::Structural,
        RuleCategory::Compatibility,
        RuleCategory::Safety,
    ];

    pub fn rank(&self) -> usize {
        match self {
            RuleCategory::Structural => 0,
            RuleCategory::Compatibility => 1,
            RuleCategory::Safety => 2,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Structural => f.write_str("structural"),
            RuleCategory::Compatibility => f.write_str("compatibility"),
            RuleCategory::Safety => f.write_str("safety"),
        }
    }
}

/// One finding. Instance ids are kept sorted and unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRuleResult {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub instance_ids: Vec<String>,
    pub category: RuleCategory,
    /// Code of the rule that produced the finding.
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationRuleResult {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        instance_ids: impl IntoIterator<Item = impl Into<String>>,
        category: RuleCategory,
        rule_id: impl Into<String>,
    ) -> Self {
        let mut ids: Vec<String> = instance_ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            instance_ids: ids,
            category,
            rule_id: rule_id.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Deduplication key: code plus sorted instance ids. Internal failures
    /// carry no instance ids, so they are also keyed by the failing rule.
    pub fn dedup_key(&self) -> (&str, &[String], Option<&str>) {
        let rule = (self.code == codes::INTERNAL_RULE_FAILURE).then_some(self.rule_id.as_str());
        (&self.code, &self.instance_ids, rule)
    }
}

/// Read-only inputs shared by every rule in a pass.
pub struct RuleContext<'a> {
    pub design: &'a Design,
    pub catalog: &'a Catalog,
    pub graph: &'a DesignGraph,
    pub connectivity: &'a ConnectivityResult,
    pub options: &'a ValidationOptions,
    instances: BTreeMap<&'a str, &'a PlacedComponent>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        design: &'a Design,
        catalog: &'a Catalog,
        graph: &'a DesignGraph,
        connectivity: &'a ConnectivityResult,
        options: &'a ValidationOptions,
    ) -> Self {
        let instances = design
            .components
            .iter()
            .map(|c| (c.instance_id.as_str(), c))
            .collect();
        Self {
            design,
            catalog,
            graph,
            connectivity,
            options,
            instances,
        }
    }

    pub fn instance(&self, instance_id: &str) -> Option<&'a PlacedComponent> {
        self.instances.get(instance_id).copied()
    }

    /// Catalog entry for an instance. Fails closed when it is missing.
    pub fn entry_for(&self, instance_id: &str) -> Result<&'a CatalogEntry, RuleError> {
        let instance = self
            .instance(instance_id)
            .ok_or_else(|| RuleError::Internal(format!("unknown instance '{}'", instance_id)))?;
        self.catalog
            .get(&instance.component_id)
            .ok_or_else(|| RuleError::MissingCatalogEntry {
                instance_id: instance_id.to_string(),
                component_id: instance.component_id.clone(),
            })
    }

    /// Like [`entry_for`](Self::entry_for), but a missing catalog entry is
    /// pushed onto `issues` as `UNKNOWN_COMPONENT` and `None` is returned, so
    /// the rule skips only what involves that instance.
    pub fn entry_or_report(
        &self,
        rule: &dyn Rule,
        instance_id: &str,
        issues: &mut Vec<ValidationRuleResult>,
    ) -> Result<Option<&'a CatalogEntry>, RuleError> {
        match self.entry_for(instance_id) {
            Ok(entry) => Ok(Some(entry)),
            Err(RuleError::MissingCatalogEntry {
                instance_id,
                component_id,
            }) => {
                issues.push(unknown_component(rule, &instance_id, &component_id));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Fail-closed finding for an instance whose catalog entry is missing.
pub fn unknown_component(
    rule: &dyn Rule,
    instance_id: &str,
    component_id: &str,
) -> ValidationRuleResult {
    ValidationRuleResult::new(
        Severity::Error,
        codes::UNKNOWN_COMPONENT,
        format!(
            "Instance '{}' references unknown catalog component '{}'",
            instance_id, component_id
        ),
        [instance_id],
        rule.category(),
        rule.code(),
    )
}

pub trait Rule: Send + Sync {
    /// Stable finding code, also used to enable or disable the rule.
    fn code(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str {
        ""
    }
    fn category(&self) -> RuleCategory;
    /// Highest severity this rule reports.
    fn severity(&self) -> Severity;
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError>;

    /// Build a finding attributed to this rule.
    fn finding(
        &self,
        severity: Severity,
        message: String,
        instance_ids: Vec<String>,
    ) -> ValidationRuleResult {
        ValidationRuleResult::new(
            severity,
            self.code(),
            message,
            instance_ids,
            self.category(),
            self.code(),
        )
    }
}

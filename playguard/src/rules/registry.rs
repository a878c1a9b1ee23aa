//! Rule Registry
//!
//! An ordered, immutable collection of rules. Rules are kept in category
//! order (Structural, Compatibility, Safety); registration order is kept
//! within a category. The registry is also the isolation boundary: a rule
//! that errors or panics becomes a finding instead of aborting the pass.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::compatibility::{IncompatibleComponentsRule, PartialCompatibilityRule};
use super::safety::{AgeRangeRule, CapacityRule, MinSpacingRule};
use super::structural::{
    ConnectionPointOccupancyRule, ConnectionTypeRule, DeckHeightRule, DisconnectedComponentRule,
};
use super::{
    codes, unknown_component, Rule, RuleCategory, RuleContext, Severity, ValidationRuleResult,
};
use crate::error::RuleError;

#[derive(Default)]
pub struct RuleRegistryBuilder {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistryBuilder {
    pub fn register(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(mut self) -> RuleRegistry {
        // Stable: registration order survives within a category.
        self.rules.sort_by_key(|r| r.category().rank());
        RuleRegistry { rules: self.rules }
    }
}

pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::default()
    }

    pub fn with_default_rules() -> Self {
        Self::default_builder().build()
    }

    /// Builder preloaded with the built-in rules, for adding custom ones.
    pub fn default_builder() -> RuleRegistryBuilder {
        Self::builder()
            .register(Arc::new(DisconnectedComponentRule))
            .register(Arc::new(ConnectionTypeRule))
            .register(Arc::new(ConnectionPointOccupancyRule))
            .register(Arc::new(DeckHeightRule))
            .register(Arc::new(IncompatibleComponentsRule))
            .register(Arc::new(PartialCompatibilityRule))
            .register(Arc::new(MinSpacingRule))
            .register(Arc::new(CapacityRule))
            .register(Arc::new(AgeRangeRule))
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn by_category(&self, category: RuleCategory) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter().filter(move |r| r.category() == category)
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter().filter(move |r| r.severity() == severity)
    }

    pub fn get(&self, code: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.code() == code)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every enabled rule in order, collecting all findings.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ValidationRuleResult> {
        let mut results = Vec::new();
        for rule in &self.rules {
            if !ctx.options.is_rule_enabled(rule.code()) {
                tracing::debug!("Skipping disabled rule {}", rule.code());
                continue;
            }
            let findings = evaluate_isolated(rule.as_ref(), ctx);
            tracing::debug!("Rule {} produced {} findings", rule.code(), findings.len());
            results.extend(findings);
        }
        results
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Run one rule, converting failures into findings.
fn evaluate_isolated(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<ValidationRuleResult> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx)));

    match outcome {
        Ok(Ok(findings)) => findings,
        Ok(Err(RuleError::MissingCatalogEntry {
            instance_id,
            component_id,
        })) => {
            tracing::warn!(
                "Rule {} stopped: no catalog entry '{}' for '{}'",
                rule.code(),
                component_id,
                instance_id
            );
            vec![unknown_component(rule, &instance_id, &component_id)]
        }
        Ok(Err(RuleError::Internal(reason))) => vec![internal_failure(rule, &reason)],
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "rule panicked".to_string());
            vec![internal_failure(rule, &reason)]
        }
    }
}

fn internal_failure(rule: &dyn Rule, reason: &str) -> ValidationRuleResult {
    tracing::warn!("Rule {} failed: {}", rule.code(), reason);
    ValidationRuleResult::new(
        Severity::Error,
        codes::INTERNAL_RULE_FAILURE,
        format!("Rule {} failed: {}", rule.code(), reason),
        Vec::<String>::new(),
        rule.category(),
        rule.code(),
    )
}

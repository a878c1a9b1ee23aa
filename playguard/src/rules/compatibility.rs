//! Compatibility rules.
//!
//! Each connection is judged in both directions: the restrictions declared
//! by one endpoint (`allowedDeckTypes`, `requiresSwingBeam`, `mountsOnDeck`,
//! `allowedConnections`, plus the connection point's own
//! `allowedConnections`) are checked against the other endpoint. Failing in
//! both directions is an error; failing in one direction is reported
//! according to [`AsymmetricPolicy`].

use super::{Rule, RuleCategory, RuleContext, Severity, ValidationRuleResult};
use crate::catalog::{CatalogEntry, ComponentCategory};
use crate::config::AsymmetricPolicy;
use crate::error::RuleError;
use crate::graph::DesignEdge;

/// Outcome of checking one connection in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCompatibility {
    /// Restrictions of `from` violated by `to`.
    pub from_violations: Vec<String>,
    /// Restrictions of `to` violated by `from`.
    pub to_violations: Vec<String>,
}

impl EdgeCompatibility {
    pub fn both_fail(&self) -> bool {
        !self.from_violations.is_empty() && !self.to_violations.is_empty()
    }

    pub fn one_fails(&self) -> bool {
        self.from_violations.is_empty() != self.to_violations.is_empty()
    }
}

/// Restrictions declared by `declarer` that `other` violates.
///
/// `point_owned` is true when the connection point of the edge belongs to
/// `declarer`, so the point's `allowedConnections` applies as well.
pub fn direction_violations(
    declarer: &CatalogEntry,
    other: &CatalogEntry,
    edge: &DesignEdge,
    point_owned: bool,
) -> Vec<String> {
    let rules = &declarer.compatibility_rules;
    let mut violations = Vec::new();

    if let Some(allowed) = &rules.allowed_deck_types {
        if other.category == ComponentCategory::Deck
            && !allowed.iter().any(|t| t == other.deck_type())
        {
            violations.push(format!(
                "{} only fits deck types [{}], not '{}'",
                declarer.id,
                allowed.join(", "),
                other.deck_type()
            ));
        }
    }

    if rules.requires_swing_beam && other.category != ComponentCategory::Beam {
        violations.push(format!(
            "{} must hang from a swing beam, not a {}",
            declarer.id, other.category
        ));
    }

    if rules.mounts_on_deck && other.category != ComponentCategory::Deck {
        violations.push(format!(
            "{} mounts on a deck, not a {}",
            declarer.id, other.category
        ));
    }

    if let Some(allowed) = &rules.allowed_connections {
        if !allowed.iter().any(|name| other.matches_name(name)) {
            violations.push(format!(
                "{} does not accept connections from {}",
                declarer.id, other.id
            ));
        }
    }

    if point_owned {
        let allowed = declarer
            .connection_point(&edge.connection_point)
            .and_then(|p| p.allowed_connections.as_ref());
        if let Some(allowed) = allowed {
            if !allowed.iter().any(|name| other.matches_name(name)) {
                violations.push(format!(
                    "point '{}' on {} does not accept {}",
                    edge.connection_point, declarer.id, other.id
                ));
            }
        }
    }

    violations
}

/// `None` when an endpoint has no catalog entry; that endpoint is reported
/// into `issues` instead.
fn check_edge(
    rule: &dyn Rule,
    ctx: &RuleContext<'_>,
    edge: &DesignEdge,
    issues: &mut Vec<ValidationRuleResult>,
) -> Result<Option<EdgeCompatibility>, RuleError> {
    let from = ctx.entry_or_report(rule, &edge.from, issues)?;
    let to = ctx.entry_or_report(rule, &edge.to, issues)?;
    let (Some(from), Some(to)) = (from, to) else {
        return Ok(None);
    };
    Ok(Some(EdgeCompatibility {
        from_violations: direction_violations(from, to, edge, edge.point_owner == edge.from),
        to_violations: direction_violations(to, from, edge, edge.point_owner == edge.to),
    }))
}

pub struct IncompatibleComponentsRule;

impl Rule for IncompatibleComponentsRule {
    fn code(&self) -> &str {
        "INCOMPATIBLE_COMPONENTS"
    }

    fn name(&self) -> &str {
        "Component Compatibility Check"
    }

    fn description(&self) -> &str {
        "Both ends of a connection reject each other"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Compatibility
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut issues = Vec::new();
        for edge in ctx.graph.edges() {
            let Some(compat) = check_edge(self, ctx, edge, &mut issues)? else {
                continue;
            };
            if compat.both_fail() {
                let reasons: Vec<String> = compat
                    .from_violations
                    .into_iter()
                    .chain(compat.to_violations)
                    .collect();
                issues.push(self.finding(
                    Severity::Error,
                    format!(
                        "'{}' and '{}' are incompatible: {}",
                        edge.from,
                        edge.to,
                        reasons.join("; ")
                    ),
                    vec![edge.from.clone(), edge.to.clone()],
                ));
            }
        }
        Ok(issues)
    }
}

pub struct PartialCompatibilityRule;

impl Rule for PartialCompatibilityRule {
    fn code(&self) -> &str {
        "PARTIAL_COMPATIBILITY"
    }

    fn name(&self) -> &str {
        "One-sided Compatibility Check"
    }

    fn description(&self) -> &str {
        "One end of a connection rejects the other; severity follows asymmetricCompatibility"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Compatibility
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let severity = match ctx.options.asymmetric_compatibility {
            AsymmetricPolicy::Ignore => return Ok(Vec::new()),
            AsymmetricPolicy::Warning => Severity::Warning,
            AsymmetricPolicy::Error => Severity::Error,
        };

        let mut issues = Vec::new();
        for edge in ctx.graph.edges() {
            let Some(compat) = check_edge(self, ctx, edge, &mut issues)? else {
                continue;
            };
            if !compat.one_fails() {
                continue;
            }
            let (declarer, reasons) = if compat.from_violations.is_empty() {
                (&edge.to, compat.to_violations)
            } else {
                (&edge.from, compat.from_violations)
            };
            issues.push(self.finding(
                severity,
                format!(
                    "'{}' rejects its connection to '{}': {}",
                    declarer,
                    edge.other_end(declarer),
                    reasons.join("; ")
                ),
                vec![edge.from.clone(), edge.to.clone()],
            ));
        }
        Ok(issues)
    }
}

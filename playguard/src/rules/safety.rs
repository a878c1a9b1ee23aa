//! Safety rules: spacing between components, age-range agreement across
//! connections, and platform load limits.

use super::{Rule, RuleCategory, RuleContext, Severity, ValidationRuleResult};
use crate::catalog::CatalogEntry;
use crate::config::ValidationOptions;
use crate::error::RuleError;

/// Largest spacing threshold that applies to a pair of entries, before
/// `spacingScale` is applied.
///
/// An entry's `requiresMinSpacing` applies to other instances of the same
/// category; configured category-pair spacings apply to the named pairs.
pub fn spacing_threshold(
    a: &CatalogEntry,
    b: &CatalogEntry,
    options: &ValidationOptions,
) -> Option<f64> {
    let mut threshold: Option<f64> = None;
    let mut consider = |value: f64| {
        threshold = Some(threshold.map_or(value, |t| t.max(value)));
    };

    if a.category == b.category {
        for entry in [a, b] {
            if let Some(spacing) = entry.compatibility_rules.requires_min_spacing {
                consider(spacing);
            }
        }
    }
    for pair in options
        .spacing
        .iter()
        .filter(|s| s.applies_to(a.category, b.category))
    {
        consider(pair.min_distance);
    }

    threshold
}

pub struct MinSpacingRule;

impl Rule for MinSpacingRule {
    fn code(&self) -> &str {
        "MIN_SPACING_VIOLATION"
    }

    fn name(&self) -> &str {
        "Minimum Spacing Check"
    }

    fn description(&self) -> &str {
        "Components with a declared minimum spacing must not be placed closer together"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Safety
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let components = &ctx.design.components;
        let mut issues = Vec::new();
        let mut entries = Vec::with_capacity(components.len());
        for component in components {
            entries.push(ctx.entry_or_report(self, &component.instance_id, &mut issues)?);
        }

        for i in 0..components.len() {
            let Some(entry_a) = entries[i] else {
                continue;
            };
            for j in (i + 1)..components.len() {
                let Some(entry_b) = entries[j] else {
                    continue;
                };
                let Some(base) = spacing_threshold(entry_a, entry_b, ctx.options) else {
                    continue;
                };
                let required = base * ctx.options.spacing_scale;
                let (a, b) = (&components[i], &components[j]);
                let distance = a.position.distance_to(&b.position);
                if distance < required {
                    issues.push(
                        self.finding(
                            Severity::Error,
                            format!(
                                "'{}' ({}) and '{}' ({}) are {:.2}m apart; \
                                 at least {:.2}m is required",
                                a.instance_id,
                                entry_a.category,
                                b.instance_id,
                                entry_b.category,
                                distance,
                                required
                            ),
                            vec![a.instance_id.clone(), b.instance_id.clone()],
                        )
                        .with_suggestion("Move the components further apart"),
                    );
                }
            }
        }

        Ok(issues)
    }
}

pub struct AgeRangeRule;

impl Rule for AgeRangeRule {
    fn code(&self) -> &str {
        "AGE_RANGE_MISMATCH"
    }

    fn name(&self) -> &str {
        "Age Range Check"
    }

    fn description(&self) -> &str {
        "Directly connected components should share an intended age range"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Safety
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut issues = Vec::new();
        for edge in ctx.graph.edges() {
            let from = ctx.entry_or_report(self, &edge.from, &mut issues)?;
            let to = ctx.entry_or_report(self, &edge.to, &mut issues)?;
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            let (Some(from_ages), Some(to_ages)) = (from.metadata.age_range, to.metadata.age_range)
            else {
                continue;
            };
            if !from_ages.overlaps(&to_ages) {
                issues.push(self.finding(
                    Severity::Warning,
                    format!(
                        "'{}' is meant for ages {} but is connected to '{}' for ages {}",
                        edge.from, from_ages, edge.to, to_ages
                    ),
                    vec![edge.from.clone(), edge.to.clone()],
                ));
            }
        }
        Ok(issues)
    }
}

pub struct CapacityRule;

impl Rule for CapacityRule {
    fn code(&self) -> &str {
        "CAPACITY_EXCEEDED"
    }

    fn name(&self) -> &str {
        "Platform Capacity Check"
    }

    fn description(&self) -> &str {
        "The combined capacity on a platform must not exceed its rated capacity"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Safety
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut issues = Vec::new();

        for platform in &ctx.design.components {
            let Some(entry) = ctx.entry_or_report(self, &platform.instance_id, &mut issues)? else {
                continue;
            };
            let Some(rated) = entry.metadata.rated_capacity else {
                continue;
            };

            // Summed in u64: catalog capacities are arbitrary u32 values.
            let mut load = u64::from(entry.metadata.capacity.unwrap_or(0));
            let mut contributors = vec![platform.instance_id.clone()];
            for neighbor in ctx.graph.neighbors(&platform.instance_id) {
                let Some(neighbor_entry) = ctx.entry_or_report(self, neighbor, &mut issues)? else {
                    continue;
                };
                let capacity = neighbor_entry.metadata.capacity.unwrap_or(0);
                if capacity > 0 {
                    load = load.saturating_add(u64::from(capacity));
                    contributors.push(neighbor.to_string());
                }
            }

            let limit = f64::from(rated) * ctx.options.capacity_margin;
            if load as f64 > limit {
                issues.push(
                    self.finding(
                        Severity::Error,
                        format!(
                            "'{}' ({}) carries {} children but is rated for {}",
                            platform.instance_id,
                            entry.display_name(),
                            load,
                            limit.floor()
                        ),
                        contributors,
                    )
                    .with_suggestion("Spread the attached components across more platforms"),
                );
            }
        }

        Ok(issues)
    }
}

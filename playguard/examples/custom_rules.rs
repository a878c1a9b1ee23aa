//! Example: registering a custom rule next to the built-in ones.
//! Run with: cargo run --example custom_rules [design.json] [catalog.json]

use playguard::{
    ComponentCategory, PlayguardCore, PlayguardError, Rule, RuleCategory, RuleContext, RuleError,
    RuleRegistry, Severity, ValidationEngine, ValidationOptions, ValidationRuleResult,
};
use std::path::Path;
use std::sync::Arc;

/// Every deck should have a ladder or climber attached.
struct DeckAccessRule;

impl Rule for DeckAccessRule {
    fn code(&self) -> &str {
        "DECK_WITHOUT_ACCESS"
    }

    fn name(&self) -> &str {
        "Deck Access Check"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Safety
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut findings = Vec::new();
        for component in &ctx.design.components {
            if ctx.entry_for(&component.instance_id)?.category != ComponentCategory::Deck {
                continue;
            }
            let mut has_access = false;
            for neighbor in ctx.graph.neighbors(&component.instance_id) {
                if ctx.entry_for(neighbor)?.category == ComponentCategory::Climber {
                    has_access = true;
                }
            }
            if !has_access {
                findings.push(self.finding(
                    Severity::Warning,
                    format!("Deck '{}' has no ladder or climber", component.instance_id),
                    vec![component.instance_id.clone()],
                ));
            }
        }
        Ok(findings)
    }
}

fn main() -> Result<(), PlayguardError> {
    let mut args = std::env::args().skip(1);
    let design = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/valid_playset.json".to_string());
    let catalog = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/catalog.json".to_string());

    let design = PlayguardCore::load_design(Path::new(&design))?;
    let catalog = PlayguardCore::load_catalog(Path::new(&catalog))?;

    let registry = RuleRegistry::default_builder()
        .register(Arc::new(DeckAccessRule))
        .build();
    let engine = ValidationEngine::new(Arc::new(registry), ValidationOptions::default());
    let report = engine.validate_or_report(&design, &catalog);

    println!("Custom validation found {} findings", report.total());
    for finding in &report.results {
        println!("  [{}] {} ({})", finding.severity, finding.message, finding.rule_id);
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

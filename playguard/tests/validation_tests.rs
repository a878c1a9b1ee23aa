//! Engine-level properties of a validation pass

use std::sync::Arc;

use playguard::catalog::{CompatibilityRules, ComponentMetadata, ConnectionPoint};
use playguard::prelude::*;
use playguard::{
    CatalogEntry, ComponentCategory, ConnectionPointType, PlacedComponent, Rule, RuleCategory,
    RuleContext, RuleError, RuleRegistry,
};

fn deck_catalog(point_type: ConnectionPointType) -> Catalog {
    Catalog::from_entries([
        CatalogEntry::new("deck-1", ComponentCategory::Deck)
            .with_point(ConnectionPoint::new("deck-north", point_type)),
        CatalogEntry::new("slide-1", ComponentCategory::Slide),
    ])
}

fn slide_on_deck() -> Design {
    Design::new()
        .with_component(PlacedComponent::new("a", "deck-1"))
        .with_component(PlacedComponent::new("b", "slide-1").connect(
            "a",
            ConnectionPointType::Slide,
            "deck-north",
        ))
}

fn spacing_catalog() -> Catalog {
    Catalog::from_entries([
        CatalogEntry::new("post", ComponentCategory::Other).with_metadata(ComponentMetadata {
            ground_level: true,
            ..Default::default()
        }),
        CatalogEntry::new("swing-set", ComponentCategory::Swing)
            .with_rules(CompatibilityRules {
                requires_min_spacing: Some(2.0),
                ..Default::default()
            }),
    ])
}

fn two_swings(distance: f64) -> Design {
    Design::new()
        .with_component(PlacedComponent::new("s1", "swing-set").at(0.0, 0.0, 0.0))
        .with_component(PlacedComponent::new("s2", "swing-set").at(distance, 0.0, 0.0))
}

#[test]
fn test_empty_design_has_no_findings() {
    let engine = ValidationEngine::default();
    let report = engine
        .validate(&Design::new(), &deck_catalog(ConnectionPointType::Slide))
        .expect("empty design is well formed");
    assert!(report.results.is_empty());
    assert!(report.is_valid());
}

#[test]
fn test_dangling_reference_aborts_the_pass() {
    let design = Design::new()
        .with_component(PlacedComponent::new("a", "deck-1"))
        .with_component(PlacedComponent::new("orphan", "slide-1"))
        .with_component(PlacedComponent::new("b", "slide-1").connect(
            "missing",
            ConnectionPointType::Slide,
            "deck-north",
        ));

    let engine = ValidationEngine::default();
    let err = engine
        .validate(&design, &deck_catalog(ConnectionPointType::Slide))
        .expect_err("dangling reference is malformed");
    assert!(matches!(err, MalformedDesignError::DanglingReference { .. }));

    // Folded into a report, only the corruption is reported.
    let report = engine.validate_or_report(&design, &deck_catalog(ConnectionPointType::Slide));
    assert!(report.malformed);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].code, "MALFORMED_DESIGN");
}

#[test]
fn test_validation_is_idempotent() {
    let catalog = spacing_catalog();
    let design = two_swings(1.0).with_component(PlacedComponent::new("p", "post"));
    let engine = ValidationEngine::default();

    let first = engine.validate(&design, &catalog).expect("well formed");
    let second = engine.validate(&design, &catalog).expect("well formed");
    assert!(!first.results.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_slide_on_matching_deck_point_is_clean() {
    let report = ValidationEngine::default()
        .validate(&slide_on_deck(), &deck_catalog(ConnectionPointType::Slide))
        .expect("well formed");
    assert!(
        report.results.is_empty(),
        "unexpected findings: {:?}",
        report.results
    );
}

#[test]
fn test_slide_on_swing_point_is_type_mismatch() {
    let report = ValidationEngine::default()
        .validate(&slide_on_deck(), &deck_catalog(ConnectionPointType::Swing))
        .expect("well formed");

    assert_eq!(report.results.len(), 1, "findings: {:?}", report.results);
    let finding = &report.results[0];
    assert_eq!(finding.code, "CONNECTION_TYPE_MISMATCH");
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.instance_ids, vec!["a".to_string(), "b".to_string()]);
    assert!(!report.is_valid());
}

#[test]
fn test_spacing_threshold() {
    let engine = ValidationEngine::default();
    let catalog = spacing_catalog();

    let close = engine.validate(&two_swings(1.0), &catalog).expect("well formed");
    let spacing: Vec<_> = close.by_code("MIN_SPACING_VIOLATION").collect();
    assert_eq!(spacing.len(), 1);
    assert_eq!(spacing[0].instance_ids, vec!["s1".to_string(), "s2".to_string()]);

    let apart = engine.validate(&two_swings(2.5), &catalog).expect("well formed");
    assert_eq!(apart.by_code("MIN_SPACING_VIOLATION").count(), 0);
}

#[test]
fn test_orphan_reported_exactly_once() {
    let catalog = spacing_catalog();
    // Both swings are orphans and too close; the post anchors nothing else.
    let design = two_swings(1.0).with_component(PlacedComponent::new("p", "post"));
    let report = ValidationEngine::default()
        .validate(&design, &catalog)
        .expect("well formed");

    for id in ["s1", "s2"] {
        let hits: Vec<_> = report
            .by_code("DISCONNECTED_COMPONENT")
            .filter(|r| r.instance_ids == vec![id.to_string()])
            .collect();
        assert_eq!(hits.len(), 1, "{} should be reported once", id);
    }
    assert_eq!(report.by_code("DISCONNECTED_COMPONENT").count(), 2);
}

#[test]
fn test_results_follow_category_order() {
    let catalog = spacing_catalog();
    let design = two_swings(1.0);
    let report = ValidationEngine::default()
        .validate(&design, &catalog)
        .expect("well formed");

    let ranks: Vec<usize> = report.results.iter().map(|r| r.category.rank()).collect();
    let mut sorted = ranks.clone();
    sorted.sort();
    assert_eq!(ranks, sorted);
    assert_eq!(report.results.first().map(|r| r.category), Some(RuleCategory::Structural));
    assert_eq!(report.results.last().map(|r| r.category), Some(RuleCategory::Safety));
}

#[test]
fn test_missing_catalog_entry_fails_closed() {
    let catalog = deck_catalog(ConnectionPointType::Slide);
    let design = Design::new()
        .with_component(PlacedComponent::new("a", "deck-1"))
        .with_component(PlacedComponent::new("ghost", "not-in-catalog"));

    let report = ValidationEngine::default()
        .validate(&design, &catalog)
        .expect("no connections, so the graph is well formed");
    let unknown: Vec<_> = report.by_code("UNKNOWN_COMPONENT").collect();
    assert_eq!(unknown.len(), 1, "duplicates across rules are merged");
    assert_eq!(unknown[0].instance_ids, vec!["ghost".to_string()]);
    assert!(!report.is_valid());
}

struct BrokenRule;

impl Rule for BrokenRule {
    fn code(&self) -> &str {
        "BROKEN_RULE"
    }
    fn name(&self) -> &str {
        "Broken Rule"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Compatibility
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let first = &ctx.design.components[99];
        Ok(vec![self.finding(Severity::Warning, first.instance_id.clone(), vec![])])
    }
}

#[test]
fn test_broken_custom_rule_does_not_blank_report() {
    let registry = RuleRegistry::default_builder()
        .register(Arc::new(BrokenRule))
        .build();
    let engine = ValidationEngine::new(Arc::new(registry), ValidationOptions::default());

    let report = engine
        .validate(&slide_on_deck(), &deck_catalog(ConnectionPointType::Swing))
        .expect("well formed");

    let codes: Vec<&str> = report.results.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["CONNECTION_TYPE_MISMATCH", "INTERNAL_RULE_FAILURE"]);
    assert!(report.results[1].message.contains("BROKEN_RULE"));
}

struct FailingRule(&'static str);

impl Rule for FailingRule {
    fn code(&self) -> &str {
        self.0
    }
    fn name(&self) -> &str {
        "Failing Rule"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Safety
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }
    fn evaluate(&self, _ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        Err(RuleError::Internal("threshold table missing".to_string()))
    }
}

#[test]
fn test_each_failing_rule_is_reported() {
    let registry = RuleRegistry::default_builder()
        .register(Arc::new(FailingRule("FIRST_FAILING")))
        .register(Arc::new(FailingRule("SECOND_FAILING")))
        .build();
    let engine = ValidationEngine::new(Arc::new(registry), ValidationOptions::default());

    let report = engine
        .validate(&slide_on_deck(), &deck_catalog(ConnectionPointType::Slide))
        .expect("well formed");

    let failed: Vec<&str> = report
        .by_code("INTERNAL_RULE_FAILURE")
        .map(|r| r.rule_id.as_str())
        .collect();
    assert_eq!(failed, vec!["FIRST_FAILING", "SECOND_FAILING"]);
}

#[test]
fn test_unknown_instance_does_not_hide_other_findings() {
    let design = two_swings(1.0).with_component(
        PlacedComponent::new("ghost", "not-in-catalog").at(50.0, 0.0, 0.0),
    );
    let report = ValidationEngine::default()
        .validate(&design, &spacing_catalog())
        .expect("no connections, so the graph is well formed");

    let spacing: Vec<_> = report.by_code("MIN_SPACING_VIOLATION").collect();
    assert_eq!(spacing.len(), 1);
    assert_eq!(spacing[0].instance_ids, vec!["s1".to_string(), "s2".to_string()]);

    let unknown: Vec<_> = report.by_code("UNKNOWN_COMPONENT").collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].instance_ids, vec!["ghost".to_string()]);
}

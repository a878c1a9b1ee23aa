//! Structural rules: grounding, deck height, connection point occupancy and
//! connection type agreement.

use std::collections::BTreeMap;

use super::{Rule, RuleCategory, RuleContext, Severity, ValidationRuleResult};
use crate::catalog::ComponentCategory;
use crate::error::RuleError;
use crate::graph::ConnectivityAnalyzer;

pub struct DisconnectedComponentRule;

impl Rule for DisconnectedComponentRule {
    fn code(&self) -> &str {
        "DISCONNECTED_COMPONENT"
    }

    fn name(&self) -> &str {
        "Disconnected Component Check"
    }

    fn description(&self) -> &str {
        "Every component must reach a grounded structure through its connections"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let issues = ctx
            .connectivity
            .orphans
            .iter()
            .map(|id| {
                let component_id = ctx.instance(id).map(|c| c.component_id.as_str()).unwrap_or("?");
                self.finding(
                    Severity::Error,
                    format!(
                        "Component '{}' ({}) is not connected to any grounded structure",
                        id, component_id
                    ),
                    vec![id.clone()],
                )
                .with_suggestion("Attach it to a deck, post or other ground-level component")
            })
            .collect();
        Ok(issues)
    }
}

pub struct DeckHeightRule;

impl Rule for DeckHeightRule {
    fn code(&self) -> &str {
        "DECK_HEIGHT_UNSATISFIED"
    }

    fn name(&self) -> &str {
        "Deck Height Requirement Check"
    }

    fn description(&self) -> &str {
        "Components declaring requiresDeckHeight must be attached to a deck of that height"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut issues = Vec::new();

        for component in &ctx.design.components {
            let Some(entry) = ctx.entry_or_report(self, &component.instance_id, &mut issues)? else {
                continue;
            };
            let Some(range) = entry.compatibility_rules.requires_deck_height else {
                continue;
            };

            let attached = ConnectivityAnalyzer::component_of(ctx.graph, &component.instance_id);
            let mut decks = Vec::new();
            let mut satisfied = false;
            for other in attached.iter().filter(|id| **id != component.instance_id) {
                let Some(other_entry) = ctx.entry_or_report(self, other, &mut issues)? else {
                    continue;
                };
                if other_entry.category != ComponentCategory::Deck {
                    continue;
                }
                decks.push(other.clone());
                if other_entry.metadata.height.is_some_and(|h| range.contains(h)) {
                    satisfied = true;
                    break;
                }
            }

            if satisfied {
                continue;
            }

            let message = if decks.is_empty() {
                format!(
                    "'{}' ({}) requires a deck at {} but is not attached to any deck",
                    component.instance_id,
                    entry.display_name(),
                    range
                )
            } else {
                format!(
                    "'{}' ({}) requires a deck at {}; none of the attached decks ({}) qualifies",
                    component.instance_id,
                    entry.display_name(),
                    range,
                    decks.join(", ")
                )
            };
            let mut ids = decks;
            ids.push(component.instance_id.clone());
            issues.push(self.finding(Severity::Error, message, ids));
        }

        Ok(issues)
    }
}

pub struct ConnectionPointOccupancyRule;

impl Rule for ConnectionPointOccupancyRule {
    fn code(&self) -> &str {
        "CONNECTION_POINT_OCCUPIED"
    }

    fn name(&self) -> &str {
        "Connection Point Occupancy Check"
    }

    fn description(&self) -> &str {
        "A connection point carries one connection unless the catalog marks it multi-connection"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut by_point: BTreeMap<(&str, &str), Vec<&str>> = BTreeMap::new();
        for edge in ctx.graph.edges() {
            by_point
                .entry((edge.point_owner.as_str(), edge.connection_point.as_str()))
                .or_default()
                .push(edge.other_end(&edge.point_owner));
        }

        let mut issues = Vec::new();
        for ((owner, point_id), attached) in by_point {
            if attached.len() < 2 {
                continue;
            }
            let entry = ctx.entry_for(owner)?;
            let point = entry.connection_point(point_id).ok_or_else(|| {
                RuleError::Internal(format!(
                    "connection point '{}' vanished from '{}'",
                    point_id, entry.id
                ))
            })?;
            if point.multi_connection {
                continue;
            }

            let mut ids: Vec<String> = attached.iter().map(|s| s.to_string()).collect();
            ids.push(owner.to_string());
            issues.push(
                self.finding(
                    Severity::Error,
                    format!(
                        "Connection point '{}' on '{}' carries {} connections but accepts only one",
                        point_id,
                        owner,
                        attached.len()
                    ),
                    ids,
                )
                .with_suggestion("Move the extra components to a free connection point"),
            );
        }

        Ok(issues)
    }
}

pub struct ConnectionTypeRule;

impl Rule for ConnectionTypeRule {
    fn code(&self) -> &str {
        "CONNECTION_TYPE_MISMATCH"
    }

    fn name(&self) -> &str {
        "Connection Type Check"
    }

    fn description(&self) -> &str {
        "A connection's type must match the declared type of its connection point"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Structural
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let mut issues = Vec::new();

        for edge in ctx.graph.edges() {
            let mut mismatches = Vec::new();
            for endpoint in [&edge.from, &edge.to] {
                let Some(entry) = ctx.entry_or_report(self, endpoint, &mut issues)? else {
                    continue;
                };
                if let Some(point) = entry.connection_point(&edge.connection_point) {
                    if point.point_type != edge.connection_type {
                        mismatches.push(format!(
                            "'{}' declares '{}' as {}",
                            endpoint, point.id, point.point_type
                        ));
                    }
                }
            }

            if !mismatches.is_empty() {
                issues.push(self.finding(
                    Severity::Error,
                    format!(
                        "{} connection between '{}' and '{}' does not match \
                         its connection point: {}",
                        edge.connection_type,
                        edge.from,
                        edge.to,
                        mismatches.join("; ")
                    ),
                    vec![edge.from.clone(), edge.to.clone()],
                ));
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Catalog, CatalogEntry, CompatibilityRules, ComponentMetadata, ConnectionPoint,
        ConnectionPointType, HeightRange,
    };
    use crate::config::ValidationOptions;
    use crate::design::{Design, PlacedComponent};
    use crate::graph::{ConnectivityAnalyzer, DesignGraph};

    fn run(
        rule: &dyn Rule,
        design: &Design,
        catalog: &Catalog,
    ) -> Result<Vec<ValidationRuleResult>, RuleError> {
        let graph = DesignGraph::build(design, catalog).expect("graph");
        let connectivity = ConnectivityAnalyzer::analyze(design, catalog, &graph);
        let options = ValidationOptions::default();
        let ctx = RuleContext::new(design, catalog, &graph, &connectivity, &options);
        rule.evaluate(&ctx)
    }

    fn deck(id: &str, height: f64) -> CatalogEntry {
        CatalogEntry::new(id, ComponentCategory::Deck)
            .with_point(ConnectionPoint::new("post", ConnectionPointType::Structural).multi())
            .with_point(ConnectionPoint::new("slide-exit", ConnectionPointType::Slide))
            .with_metadata(ComponentMetadata {
                height: Some(height),
                ground_level: true,
                ..Default::default()
            })
    }

    fn tall_slide() -> CatalogEntry {
        CatalogEntry::new("slide-tall", ComponentCategory::Slide).with_rules(CompatibilityRules {
            requires_deck_height: Some(HeightRange {
                min: Some(1.5),
                max: Some(2.0),
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_disconnected_reports_each_orphan_once() {
        let catalog = Catalog::from_entries([deck("deck-low", 1.0), tall_slide()]);
        let design = Design::new()
            .with_component(PlacedComponent::new("d1", "deck-low"))
            .with_component(PlacedComponent::new("s1", "slide-tall"))
            .with_component(PlacedComponent::new("s2", "slide-tall"));

        let issues = run(&DisconnectedComponentRule, &design, &catalog).expect("rule runs");
        let ids: Vec<_> = issues.iter().map(|i| i.instance_ids.clone()).collect();
        assert_eq!(ids, vec![vec!["s1".to_string()], vec!["s2".to_string()]]);
        assert!(issues.iter().all(|i| i.code == "DISCONNECTED_COMPONENT"));
    }

    #[test]
    fn test_deck_height_satisfied_and_violated() {
        let catalog =
            Catalog::from_entries([deck("deck-low", 1.0), deck("deck-high", 1.8), tall_slide()]);

        let ok = Design::new()
            .with_component(PlacedComponent::new("d1", "deck-high"))
            .with_component(PlacedComponent::new("s1", "slide-tall").connect(
                "d1",
                ConnectionPointType::Slide,
                "slide-exit",
            ));
        assert!(run(&DeckHeightRule, &ok, &catalog).expect("rule runs").is_empty());

        let too_low = Design::new()
            .with_component(PlacedComponent::new("d1", "deck-low"))
            .with_component(PlacedComponent::new("s1", "slide-tall").connect(
                "d1",
                ConnectionPointType::Slide,
                "slide-exit",
            ));
        let issues = run(&DeckHeightRule, &too_low, &catalog).expect("rule runs");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].instance_ids, vec!["d1".to_string(), "s1".to_string()]);
        assert!(issues[0].message.contains("none of the attached decks"));
    }

    #[test]
    fn test_deck_height_fails_closed_per_instance() {
        let catalog = Catalog::from_entries([deck("deck-low", 1.0), tall_slide()]);
        let design = Design::new()
            .with_component(PlacedComponent::new("x", "mystery"))
            .with_component(PlacedComponent::new("d1", "deck-low"))
            .with_component(PlacedComponent::new("s1", "slide-tall").connect(
                "d1",
                ConnectionPointType::Slide,
                "slide-exit",
            ));

        let issues = run(&DeckHeightRule, &design, &catalog).expect("rule runs");
        let codes: Vec<_> = issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["UNKNOWN_COMPONENT", "DECK_HEIGHT_UNSATISFIED"]);
        assert_eq!(issues[0].instance_ids, vec!["x".to_string()]);
    }

    #[test]
    fn test_single_point_occupied_twice() {
        let catalog = Catalog::from_entries([
            deck("deck-low", 1.0),
            CatalogEntry::new("slide-1", ComponentCategory::Slide),
        ]);
        let design = Design::new()
            .with_component(PlacedComponent::new("d1", "deck-low"))
            .with_component(PlacedComponent::new("s1", "slide-1").connect(
                "d1",
                ConnectionPointType::Slide,
                "slide-exit",
            ))
            .with_component(PlacedComponent::new("s2", "slide-1").connect(
                "d1",
                ConnectionPointType::Slide,
                "slide-exit",
            ));

        let issues = run(&ConnectionPointOccupancyRule, &design, &catalog).expect("rule runs");
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].instance_ids,
            vec!["d1".to_string(), "s1".to_string(), "s2".to_string()]
        );
    }

    #[test]
    fn test_multi_connection_point_accepts_many() {
        let catalog = Catalog::from_entries([
            deck("deck-low", 1.0),
            CatalogEntry::new("post-1", ComponentCategory::Other),
        ]);
        let design = Design::new()
            .with_component(PlacedComponent::new("d1", "deck-low"))
            .with_component(PlacedComponent::new("p1", "post-1").connect(
                "d1",
                ConnectionPointType::Structural,
                "post",
            ))
            .with_component(PlacedComponent::new("p2", "post-1").connect(
                "d1",
                ConnectionPointType::Structural,
                "post",
            ));

        assert!(run(&ConnectionPointOccupancyRule, &design, &catalog)
            .expect("rule runs")
            .is_empty());
    }

    #[test]
    fn test_connection_type_mismatch() {
        let catalog = Catalog::from_entries([
            deck("deck-low", 1.0),
            CatalogEntry::new("swing-1", ComponentCategory::Swing),
        ]);
        let design = Design::new()
            .with_component(PlacedComponent::new("d1", "deck-low"))
            .with_component(PlacedComponent::new("w1", "swing-1").connect(
                "d1",
                ConnectionPointType::Swing,
                "slide-exit",
            ));

        let issues = run(&ConnectionTypeRule, &design, &catalog).expect("rule runs");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("declares 'slide-exit' as slide"));
        assert_eq!(issues[0].instance_ids, vec!["d1".to_string(), "w1".to_string()]);
    }
}

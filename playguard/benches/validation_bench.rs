use criterion::{black_box, criterion_group, criterion_main, Criterion};
use playguard::catalog::{CompatibilityRules, ComponentMetadata, ConnectionPoint};
use playguard::prelude::*;
use playguard::{CatalogEntry, ComponentCategory, ConnectionPointType, DesignGraph, PlacedComponent};

fn bench_catalog() -> Catalog {
    Catalog::from_entries([
        CatalogEntry::new("deck", ComponentCategory::Deck)
            .with_point(ConnectionPoint::new("next", ConnectionPointType::Deck).multi())
            .with_point(ConnectionPoint::new("slide", ConnectionPointType::Slide))
            .with_metadata(ComponentMetadata {
                ground_level: true,
                rated_capacity: Some(6),
                height: Some(1.2),
                ..Default::default()
            }),
        CatalogEntry::new("slide", ComponentCategory::Slide)
            .with_rules(CompatibilityRules {
                mounts_on_deck: true,
                requires_min_spacing: Some(1.5),
                ..Default::default()
            })
            .with_metadata(ComponentMetadata {
                capacity: Some(1),
                ..Default::default()
            }),
    ])
}

/// A row of 75 decks, each with a slide: 150 components.
fn bench_design() -> Design {
    let mut design = Design::new();
    for i in 0..75 {
        let deck_id = format!("deck-{}", i);
        let mut deck = PlacedComponent::new(deck_id.clone(), "deck").at(i as f64 * 2.0, 0.0, 0.0);
        if i > 0 {
            deck = deck.connect(format!("deck-{}", i - 1), ConnectionPointType::Deck, "next");
        }
        design = design.with_component(deck).with_component(
            PlacedComponent::new(format!("slide-{}", i), "slide")
                .at(i as f64 * 2.0, 0.0, 2.0)
                .connect(deck_id, ConnectionPointType::Slide, "slide"),
        );
    }
    design
}

fn bench_validate_design(c: &mut Criterion) {
    let catalog = bench_catalog();
    let design = bench_design();
    let engine = ValidationEngine::default();

    c.bench_function("validate_design", |b| {
        b.iter(|| engine.validate(black_box(&design), black_box(&catalog)));
    });
}

fn bench_build_graph(c: &mut Criterion) {
    let catalog = bench_catalog();
    let design = bench_design();

    c.bench_function("build_graph", |b| {
        b.iter(|| DesignGraph::build(black_box(&design), black_box(&catalog)));
    });
}

criterion_group!(benches, bench_validate_design, bench_build_graph);
criterion_main!(benches);

//! Simple validation example: validate a design against a catalog and print results.
//! Run with: cargo run --example simple_validation [design.json] [catalog.json]

use playguard::prelude::*;
use std::path::Path;

fn main() -> Result<(), PlayguardError> {
    let mut args = std::env::args().skip(1);
    let design = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/problem_playset.json".to_string());
    let catalog = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/catalog.json".to_string());
    let (design, catalog) = (Path::new(&design), Path::new(&catalog));

    for path in [design, catalog] {
        if !path.exists() {
            eprintln!("File not found: {}", path.display());
            eprintln!("Usage: cargo run --example simple_validation [design.json] [catalog.json]");
            std::process::exit(1);
        }
    }

    let report = PlayguardCore::validate_files(design, catalog, ValidationOptions::default())?;

    println!("Validation results for: {}", design.display());
    println!("Total findings: {}", report.total());
    println!();

    for finding in &report.results {
        println!("  [{}] {}: {}", finding.severity, finding.code, finding.message);
        if !finding.instance_ids.is_empty() {
            println!("    Components: {}", finding.instance_ids.join(", "));
        }
    }

    if !report.is_valid() {
        println!("\nValidation failed ({} errors).", report.stats.errors);
        std::process::exit(1);
    }

    println!("\nValidation passed ({} warnings).", report.stats.warnings);
    Ok(())
}

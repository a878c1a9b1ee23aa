//! Playguard - validation engine for modular playground designs
//!
//! A design is a set of placed catalog components and the connections
//! between them. Before a design is saved or quoted, Playguard decides
//! whether it is structurally sound, internally compatible and
//! safety-compliant, and reports errors (which block) and warnings (which
//! don't).
//!
//! # Quick Start
//!
//! ```no_run
//! use playguard::{Catalog, Design, ValidationEngine};
//!
//! let design_json = std::fs::read_to_string("design.json").unwrap();
//! let catalog_json = std::fs::read_to_string("catalog.json").unwrap();
//! let design = Design::from_json_str(&design_json).unwrap();
//! let catalog = Catalog::from_json_str(&catalog_json).unwrap();
//!
//! let report = ValidationEngine::default().validate_or_report(&design, &catalog);
//! for finding in &report.results {
//!     println!("{}: {} {:?}", finding.severity, finding.message, finding.instance_ids);
//! }
//! ```
//!
//! # Pipeline
//!
//! - **Graph builder**: rejects duplicate ids, dangling references and
//!   unknown connection points before any rule runs
//! - **Connectivity**: breadth-first reachability from grounded anchors
//! - **Rules**: Structural, then Compatibility, then Safety
//! - **Aggregation**: deduplication on code plus instance ids

pub mod acceptance;
pub mod catalog;
pub mod config;
pub mod core;
pub mod design;
pub mod error;
pub mod graph;
pub mod rules;

// Re-export main types
pub use acceptance::{AcceptanceAction, AcceptanceGate, ValidationRejection};
pub use catalog::{Catalog, CatalogEntry, CatalogSource, ComponentCategory, ConnectionPointType};
pub use config::{AsymmetricPolicy, OverlapPolicy, ValidationOptions};
pub use crate::core::{PlayguardCore, ValidationEngine, ValidationReport, ValidationStats};
pub use design::{Connection, Design, PlacedComponent, Vec3};
pub use error::{MalformedDesignError, PlayguardError, RuleError};
pub use graph::{ConnectivityAnalyzer, ConnectivityResult, DesignGraph};
pub use rules::{Rule, RuleCategory, RuleContext, RuleRegistry, Severity, ValidationRuleResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Catalog, Design, MalformedDesignError, PlayguardCore, PlayguardError, Severity,
        ValidationEngine, ValidationOptions, ValidationReport, ValidationRuleResult,
    };
}

//! Component Catalog
//!
//! Read-only per-component metadata (category, connection points,
//! compatibility constraints, physical attributes) and the sources that
//! pre-fetch a catalog snapshot before validation runs.

pub mod schema;
pub mod source;

pub use schema::*;
pub use source::{
    CatalogSource, CatalogSourceError, FileCatalogSource, HttpCatalogSource, StaticCatalogSource,
};

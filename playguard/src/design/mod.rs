//! Design Model
//!
//! Serializable snapshot of a playset configuration: placed component
//! instances and the connections between them. Built by the editing surface,
//! treated as immutable input by the validation engine.

pub mod schema;

pub use schema::*;

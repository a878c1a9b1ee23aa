//! Design Graph
//!
//! Graph construction and connectivity analysis. Both run once per
//! validation pass; their results are shared read-only with every rule.

pub mod builder;
pub mod connectivity;

pub use builder::{DesignEdge, DesignGraph};
pub use connectivity::{ConnectivityAnalyzer, ConnectivityResult};

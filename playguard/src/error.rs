//! Error types shared across the validation pipeline.
//!
//! Domain findings are never errors: they are returned as
//! [`ValidationRuleResult`](crate::rules::ValidationRuleResult) entries. The
//! types here cover the two cases that are not findings: a corrupt design
//! graph, which aborts the pass, and a rule that could not finish.

use thiserror::Error;

use crate::catalog::CatalogSourceError;
use crate::config::ConfigError;

/// Structural corruption detected while building the design graph.
///
/// Any of these aborts the validation pass before a single rule runs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedDesignError {
    #[error("Instance id '{instance_id}' is used by more than one component")]
    DuplicateInstanceId { instance_id: String },

    #[error("Connection on '{instance_id}' connects the instance to itself")]
    SelfConnection { instance_id: String },

    #[error("Connection declared on '{declared_on}' references missing instance '{missing_id}'")]
    DanglingReference {
        declared_on: String,
        missing_id: String,
    },

    #[error(
        "Connection point '{connection_point}' is not declared by the components of \
         '{from_instance_id}' or '{to_instance_id}'"
    )]
    UnknownConnectionPoint {
        from_instance_id: String,
        to_instance_id: String,
        connection_point: String,
    },

    #[error("Instance '{instance_id}' references unknown catalog component '{component_id}'")]
    UnknownComponent {
        instance_id: String,
        component_id: String,
    },
}

impl MalformedDesignError {
    /// Instance ids involved in the corruption, sorted.
    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids = match self {
            MalformedDesignError::DuplicateInstanceId { instance_id }
            | MalformedDesignError::SelfConnection { instance_id }
            | MalformedDesignError::UnknownComponent { instance_id, .. } => {
                vec![instance_id.clone()]
            }
            MalformedDesignError::DanglingReference {
                declared_on,
                missing_id,
            } => vec![declared_on.clone(), missing_id.clone()],
            MalformedDesignError::UnknownConnectionPoint {
                from_instance_id,
                to_instance_id,
                ..
            } => vec![from_instance_id.clone(), to_instance_id.clone()],
        };
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Failure of a single rule. Converted into a finding at the registry
/// boundary; never propagated out of the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("No catalog entry '{component_id}' for instance '{instance_id}'")]
    MissingCatalogEntry {
        instance_id: String,
        component_id: String,
    },

    #[error("{0}")]
    Internal(String),
}

/// Top-level error for the convenience entry points in [`crate::core`].
#[derive(Debug, Error)]
pub enum PlayguardError {
    #[error("Malformed design: {0}")]
    Malformed(#[from] MalformedDesignError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogSourceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

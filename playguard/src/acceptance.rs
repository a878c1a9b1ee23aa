//! Server-side acceptance gate.
//!
//! Saving a design or submitting a quote is irreversible, so the server
//! re-runs the engine itself instead of trusting the client's result. Any
//! error-severity finding rejects the request with a structured response
//! carrying the same result list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::core::{ValidationEngine, ValidationReport};
use crate::design::Design;
use crate::rules::ValidationRuleResult;

/// HTTP status used for rejected designs.
pub const REJECTION_STATUS: u16 = 422;
pub const REJECTION_ERROR: &str = "DESIGN_VALIDATION_FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcceptanceAction {
    SaveDesign,
    SubmitQuote,
}

impl AcceptanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptanceAction::SaveDesign => "saveDesign",
            AcceptanceAction::SubmitQuote => "submitQuote",
        }
    }
}

/// Structured validation-error response body.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{action:?} rejected: {error_count} validation error(s)")]
pub struct ValidationRejection {
    pub status: u16,
    pub error: &'static str,
    pub action: AcceptanceAction,
    pub error_count: usize,
    pub results: Vec<ValidationRuleResult>,
}

impl ValidationRejection {
    fn from_report(action: AcceptanceAction, report: ValidationReport) -> Self {
        Self {
            status: REJECTION_STATUS,
            error: REJECTION_ERROR,
            action,
            error_count: report.stats.errors,
            results: report.results,
        }
    }
}

pub struct AcceptanceGate {
    engine: ValidationEngine,
}

impl AcceptanceGate {
    pub fn new(engine: ValidationEngine) -> Self {
        Self { engine }
    }

    /// Accept the design for `action` or reject it. On acceptance the
    /// report is returned so warnings can still be surfaced.
    pub fn check(
        &self,
        action: AcceptanceAction,
        design: &Design,
        catalog: &Catalog,
    ) -> Result<ValidationReport, ValidationRejection> {
        let report = self.engine.validate_or_report(design, catalog);
        if report.is_valid() {
            tracing::debug!(
                "Accepted {} with {} warning(s)",
                action.as_str(),
                report.stats.warnings
            );
            Ok(report)
        } else {
            tracing::info!(
                "Rejected {}: {} validation error(s)",
                action.as_str(),
                report.stats.errors
            );
            Err(ValidationRejection::from_report(action, report))
        }
    }

    /// Accept a design submitted as its serialized JSON record.
    pub fn check_json(
        &self,
        action: AcceptanceAction,
        design_json: &str,
        catalog: &Catalog,
    ) -> Result<Result<ValidationReport, ValidationRejection>, serde_json::Error> {
        let design = Design::from_json_str(design_json)?;
        Ok(self.check(action, &design, catalog))
    }
}

impl Default for AcceptanceGate {
    fn default() -> Self {
        Self::new(ValidationEngine::default())
    }
}

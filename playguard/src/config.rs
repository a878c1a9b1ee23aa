//! Validation Options
//!
//! Thresholds and policies that shape rule evaluation. Every field has a
//! default, so an empty JSON object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ComponentCategory;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// How a one-sided compatibility violation is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsymmetricPolicy {
    #[default]
    Warning,
    Error,
    Ignore,
}

/// How findings from different categories over the same instances merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlapPolicy {
    /// Only exact `(code, instances)` duplicates are merged.
    #[default]
    ReportAll,
    /// Findings whose instance set already carries an error from an earlier
    /// category are dropped.
    PreferEarliestCategory,
}

/// Minimum distance between instances of two categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpacing {
    pub categories: [ComponentCategory; 2],
    pub min_distance: f64,
}

impl CategorySpacing {
    pub fn applies_to(&self, a: ComponentCategory, b: ComponentCategory) -> bool {
        let [first, second] = self.categories;
        (first == a && second == b) || (first == b && second == a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Rule codes to skip.
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub asymmetric_compatibility: AsymmetricPolicy,
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
    /// Extra spacing requirements between category pairs.
    #[serde(default)]
    pub spacing: Vec<CategorySpacing>,
    /// Multiplier applied to every spacing threshold.
    #[serde(default = "default_scale")]
    pub spacing_scale: f64,
    /// Multiplier applied to every platform's rated capacity.
    #[serde(default = "default_scale")]
    pub capacity_margin: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            disabled_rules: vec![],
            asymmetric_compatibility: AsymmetricPolicy::default(),
            overlap_policy: OverlapPolicy::default(),
            spacing: vec![],
            spacing_scale: default_scale(),
            capacity_margin: default_scale(),
        }
    }
}

impl ValidationOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: ValidationOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn is_rule_enabled(&self, code: &str) -> bool {
        !self.disabled_rules.iter().any(|d| d == code)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spacing_scale.is_finite() && self.spacing_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "spacingScale must be positive, got {}",
                self.spacing_scale
            )));
        }
        if !(self.capacity_margin.is_finite() && self.capacity_margin > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "capacityMargin must be positive, got {}",
                self.capacity_margin
            )));
        }
        if let Some(bad) = self
            .spacing
            .iter()
            .find(|s| !(s.min_distance.is_finite() && s.min_distance >= 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "minDistance must be non-negative, got {}",
                bad.min_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let options = ValidationOptions::from_json_str("{}").expect("defaults");
        assert_eq!(options, ValidationOptions::default());
        assert_eq!(options.asymmetric_compatibility, AsymmetricPolicy::Warning);
        assert!(options.is_rule_enabled("DISCONNECTED_COMPONENT"));
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "disabledRules": ["AGE_RANGE_MISMATCH"],
            "asymmetricCompatibility": "error",
            "overlapPolicy": "preferEarliestCategory",
            "spacing": [{"categories": ["swing", "slide"], "minDistance": 1.8}],
            "spacingScale": 1.5
        }"#;
        let options = ValidationOptions::from_json_str(json).expect("config should parse");
        assert!(!options.is_rule_enabled("AGE_RANGE_MISMATCH"));
        assert_eq!(options.asymmetric_compatibility, AsymmetricPolicy::Error);
        assert_eq!(options.overlap_policy, OverlapPolicy::PreferEarliestCategory);
        assert!(options.spacing[0].applies_to(ComponentCategory::Slide, ComponentCategory::Swing));
        assert_eq!(options.capacity_margin, 1.0);
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let err = ValidationOptions::from_json_str(r#"{"spacingScale": 0}"#)
            .expect_err("zero scale is invalid");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}

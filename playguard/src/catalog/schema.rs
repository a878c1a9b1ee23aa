use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::design::Vec3;

/// Fixed set of attachment kinds a connection point can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPointType {
    Deck,
    Slide,
    Swing,
    Structural,
    Access,
}

impl ConnectionPointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPointType::Deck => "deck",
            ConnectionPointType::Slide => "slide",
            ConnectionPointType::Swing => "swing",
            ConnectionPointType::Structural => "structural",
            ConnectionPointType::Access => "access",
        }
    }
}

impl fmt::Display for ConnectionPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Deck,
    Slide,
    Swing,
    Climber,
    Beam,
    Roof,
    Accessory,
    #[serde(other)]
    Other,
}

impl ComponentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentCategory::Deck => "deck",
            ComponentCategory::Slide => "slide",
            ComponentCategory::Swing => "swing",
            ComponentCategory::Climber => "climber",
            ComponentCategory::Beam => "beam",
            ComponentCategory::Roof => "roof",
            ComponentCategory::Accessory => "accessory",
            ComponentCategory::Other => "other",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed attachment location declared once on a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPoint {
    pub id: String,
    #[serde(rename = "type")]
    pub point_type: ConnectionPointType,
    /// Position local to the component origin.
    #[serde(default)]
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Vec3>,
    /// Component ids or category names allowed to attach here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_connections: Option<Vec<String>>,
    /// Whether more than one connection may share this point.
    #[serde(default)]
    pub multi_connection: bool,
}

impl ConnectionPoint {
    pub fn new(id: impl Into<String>, point_type: ConnectionPointType) -> Self {
        Self {
            id: id.into(),
            point_type,
            position: Vec3::ZERO,
            orientation: None,
            allowed_connections: None,
            multi_connection: false,
        }
    }

    pub fn multi(mut self) -> Self {
        self.multi_connection = true;
        self
    }

    pub fn allowing(mut self, allowed: &[&str]) -> Self {
        self.allowed_connections = Some(allowed.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Inclusive height window, in meters. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeightRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl HeightRange {
    pub fn contains(&self, height: f64) -> bool {
        self.min.map_or(true, |min| height >= min) && self.max.map_or(true, |max| height <= max)
    }
}

impl fmt::Display for HeightRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{:.2}m-{:.2}m", min, max),
            (Some(min), None) => write!(f, ">= {:.2}m", min),
            (None, Some(max)) => write!(f, "<= {:.2}m", max),
            (None, None) => f.write_str("any height"),
        }
    }
}

/// Compatibility constraints a component places on whatever it connects to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityRules {
    /// Deck types (`metadata.deckType`, falling back to component id) this
    /// component may attach to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_deck_types: Option<Vec<String>>,
    /// Must hang from a beam.
    #[serde(default)]
    pub requires_swing_beam: bool,
    /// Must mount directly on a deck.
    #[serde(default)]
    pub mounts_on_deck: bool,
    /// Component ids or category names this component may connect to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_connections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_deck_height: Option<HeightRange>,
    /// Minimum distance to other instances of the same category (meters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_min_spacing: Option<f64>,
}

impl CompatibilityRules {
    pub fn has_connection_restrictions(&self) -> bool {
        self.allowed_deck_types.is_some()
            || self.requires_swing_beam
            || self.mounts_on_deck
            || self.allowed_connections.is_some()
    }
}

/// Inclusive age window, in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn overlaps(&self, other: &AgeRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    /// Number of children this component carries at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Load a platform is rated for, in children. Marks the entry as a platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_capacity: Option<u32>,
    #[serde(default)]
    pub materials: Vec<String>,
    /// Deck surface height (meters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_type: Option<String>,
    /// Stands on the ground by itself; anchors connectivity.
    #[serde(default)]
    pub ground_level: bool,
}

/// Per-component metadata supplied by the external component catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub category: ComponentCategory,
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
    #[serde(default)]
    pub compatibility_rules: CompatibilityRules,
    #[serde(default)]
    pub metadata: ComponentMetadata,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, category: ComponentCategory) -> Self {
        Self {
            id: id.into(),
            name: None,
            category,
            connection_points: Vec::new(),
            compatibility_rules: CompatibilityRules::default(),
            metadata: ComponentMetadata::default(),
        }
    }

    pub fn with_point(mut self, point: ConnectionPoint) -> Self {
        self.connection_points.push(point);
        self
    }

    pub fn with_rules(mut self, rules: CompatibilityRules) -> Self {
        self.compatibility_rules = rules;
        self
    }

    pub fn with_metadata(mut self, metadata: ComponentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn connection_point(&self, id: &str) -> Option<&ConnectionPoint> {
        self.connection_points.iter().find(|p| p.id == id)
    }

    /// Decks and ground-level entries are grounded, as is anything with a
    /// structural point.
    pub fn is_anchor(&self) -> bool {
        self.category == ComponentCategory::Deck
            || self.metadata.ground_level
            || self
                .connection_points
                .iter()
                .any(|p| p.point_type == ConnectionPointType::Structural)
    }

    /// Deck type used by `allowedDeckTypes`; falls back to the entry id.
    pub fn deck_type(&self) -> &str {
        self.metadata.deck_type.as_deref().unwrap_or(&self.id)
    }

    /// Matches an `allowedConnections`-style name against id or category.
    pub fn matches_name(&self, name: &str) -> bool {
        name == self.id || name.eq_ignore_ascii_case(self.category.as_str())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogListing {
    Bare(Vec<CatalogEntry>),
    Wrapped { components: Vec<CatalogEntry> },
}

/// Immutable in-memory lookup of catalog entries by component id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            if let Some(previous) = map.insert(entry.id.clone(), entry) {
                tracing::warn!("Duplicate catalog entry '{}', keeping the last one", previous.id);
            }
        }
        Self { entries: map }
    }

    /// Parse either a bare JSON array of entries or a component-listing
    /// response of the form `{"components": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let listing: CatalogListing = serde_json::from_str(json)?;
        let entries = match listing {
            CatalogListing::Bare(entries) => entries,
            CatalogListing::Wrapped { components } => components,
        };
        Ok(Self::from_entries(entries))
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let entries: Vec<&CatalogEntry> = self.entries.values().collect();
        serde_json::to_string_pretty(&entries)
    }

    pub fn get(&self, component_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(component_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_from_json() {
        let json = r#"[{
            "id": "deck-1",
            "category": "deck",
            "connectionPoints": [
                {"id": "deck-north", "type": "slide"},
                {"id": "post-a", "type": "structural", "multiConnection": true}
            ],
            "compatibilityRules": {"requiresMinSpacing": 2.0},
            "metadata": {"ageRange": {"min": 3, "max": 10}, "height": 1.2, "materials": ["cedar"]}
        }]"#;

        let catalog = Catalog::from_json_str(json).expect("catalog should parse");
        let deck = catalog.get("deck-1").expect("deck-1 present");
        assert_eq!(deck.category, ComponentCategory::Deck);
        assert_eq!(deck.connection_points.len(), 2);
        assert!(deck.connection_point("post-a").map(|p| p.multi_connection).unwrap_or(false));
        assert!(deck.is_anchor());
        assert_eq!(deck.compatibility_rules.requires_min_spacing, Some(2.0));
        assert_eq!(deck.metadata.materials, vec!["cedar".to_string()]);
    }

    #[test]
    fn test_wrapped_listing_and_unknown_category() {
        let json = r#"{"components": [{"id": "flag-1", "category": "flagpole"}]}"#;
        let catalog = Catalog::from_json_str(json).expect("listing should parse");
        assert_eq!(catalog.get("flag-1").map(|e| e.category), Some(ComponentCategory::Other));
        assert!(!catalog.get("flag-1").map(|e| e.is_anchor()).unwrap_or(true));
    }

    #[test]
    fn test_decks_are_anchors_without_ground_flag() {
        let deck = CatalogEntry::new("deck-1", ComponentCategory::Deck)
            .with_point(ConnectionPoint::new("deck-north", ConnectionPointType::Slide));
        assert!(deck.is_anchor());
        assert!(!CatalogEntry::new("slide-1", ComponentCategory::Slide).is_anchor());
    }

    #[test]
    fn test_ranges() {
        let toddler = AgeRange { min: 2, max: 5 };
        let big_kid = AgeRange { min: 6, max: 12 };
        let school = AgeRange { min: 5, max: 12 };
        assert!(!toddler.overlaps(&big_kid));
        assert!(toddler.overlaps(&school));

        let range = HeightRange { min: Some(1.0), max: Some(1.5) };
        assert!(range.contains(1.0));
        assert!(range.contains(1.5));
        assert!(!range.contains(1.6));
        assert!(HeightRange::default().contains(42.0));
    }
}

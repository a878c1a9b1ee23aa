use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ConnectionPointType;

/// A point or direction in design space (meters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between two points.
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One edge of the design graph, as declared by the editing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_instance_id: String,
    pub to_instance_id: String,
    pub connection_type: ConnectionPointType,
    /// Connection point id, declared on the catalog entry of one endpoint.
    pub connection_point: String,
}

impl Connection {
    pub fn new(
        from_instance_id: impl Into<String>,
        to_instance_id: impl Into<String>,
        connection_type: ConnectionPointType,
        connection_point: impl Into<String>,
    ) -> Self {
        Self {
            from_instance_id: from_instance_id.into(),
            to_instance_id: to_instance_id.into(),
            connection_type,
            connection_point: connection_point.into(),
        }
    }

    /// The endpoint opposite `instance_id`, if `instance_id` is an endpoint.
    pub fn other_end(&self, instance_id: &str) -> Option<&str> {
        if self.from_instance_id == instance_id {
            Some(&self.to_instance_id)
        } else if self.to_instance_id == instance_id {
            Some(&self.from_instance_id)
        } else {
            None
        }
    }
}

/// One occurrence of a catalog component within a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedComponent {
    pub instance_id: String,
    pub component_id: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl PlacedComponent {
    pub fn new(instance_id: impl Into<String>, component_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            component_id: component_id.into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            connections: Vec::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotated(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    /// Declare a connection from this instance to `to_instance_id`.
    pub fn connect(
        mut self,
        to_instance_id: impl Into<String>,
        connection_type: ConnectionPointType,
        connection_point: impl Into<String>,
    ) -> Self {
        let conn = Connection::new(
            self.instance_id.clone(),
            to_instance_id,
            connection_type,
            connection_point,
        );
        self.connections.push(conn);
        self
    }
}

/// Descriptive data carried alongside a design. Never inspected by rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Anything else the editing surface stores with the design.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The full playset configuration being validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    #[serde(default)]
    pub components: Vec<PlacedComponent>,
    #[serde(default)]
    pub metadata: DesignMetadata,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: PlacedComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Look up an instance by id (first match).
    pub fn component(&self, instance_id: &str) -> Option<&PlacedComponent> {
        self.components.iter().find(|c| c.instance_id == instance_id)
    }

    /// Every declared connection, in declaration order.
    pub fn connections(&self) -> impl Iterator<Item = (&PlacedComponent, &Connection)> {
        self.components
            .iter()
            .flat_map(|c| c.connections.iter().map(move |conn| (c, conn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_euclidean() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_design_parses_camel_case_json() {
        let json = r#"{
            "components": [
                {"instanceId": "a", "componentId": "deck-1", "position": {"x": 1.0}},
                {"instanceId": "b", "componentId": "slide-1", "connections": [
                    {"fromInstanceId": "b", "toInstanceId": "a",
                     "connectionType": "slide", "connectionPoint": "deck-north"}
                ]}
            ],
            "metadata": {"name": "Backyard", "createdAt": "2026-03-01T10:00:00Z", "theme": "pirate"}
        }"#;

        let design = Design::from_json_str(json).expect("design should parse");
        assert_eq!(design.components.len(), 2);
        assert_eq!(design.components[0].position.x, 1.0);
        assert_eq!(design.components[0].position.z, 0.0);
        assert_eq!(design.metadata.name.as_deref(), Some("Backyard"));
        assert!(design.metadata.created_at.is_some());
        assert_eq!(
            design.metadata.extra.get("theme"),
            Some(&serde_json::Value::String("pirate".to_string()))
        );

        let conns: Vec<_> = design.connections().collect();
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].1.connection_type, ConnectionPointType::Slide);
        assert_eq!(conns[0].1.other_end("a"), Some("b"));
    }
}

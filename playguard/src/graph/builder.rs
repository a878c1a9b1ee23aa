//! Design Graph Builder
//!
//! Turns a [`Design`] into an undirected petgraph of instance nodes and typed
//! connection edges, rejecting corrupt designs before any rule sees them.

use std::collections::{BTreeMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ConnectionPointType};
use crate::design::{Connection, Design};
use crate::error::MalformedDesignError;

/// Edge weight: one resolved connection between two instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignEdge {
    pub from: String,
    pub to: String,
    pub connection_type: ConnectionPointType,
    pub connection_point: String,
    /// Instance whose catalog entry declares `connection_point`.
    pub point_owner: String,
}

impl DesignEdge {
    /// Both endpoints, sorted.
    pub fn endpoints(&self) -> [&str; 2] {
        if self.from <= self.to {
            [&self.from, &self.to]
        } else {
            [&self.to, &self.from]
        }
    }

    pub fn other_end(&self, instance_id: &str) -> &str {
        if self.from == instance_id {
            &self.to
        } else {
            &self.from
        }
    }
}

#[derive(Debug, Clone)]
pub struct DesignGraph {
    graph: UnGraph<String, DesignEdge>,
    indices: BTreeMap<String, NodeIndex>,
}

impl DesignGraph {
    /// Build the graph, enforcing the pre-rule invariants: unique instance
    /// ids, connections between two distinct existing instances, and
    /// connection points declared on a referenced catalog entry.
    pub fn build(design: &Design, catalog: &Catalog) -> Result<Self, MalformedDesignError> {
        let mut graph = UnGraph::new_undirected();
        let mut indices = BTreeMap::new();

        for component in &design.components {
            if indices.contains_key(&component.instance_id) {
                return Err(MalformedDesignError::DuplicateInstanceId {
                    instance_id: component.instance_id.clone(),
                });
            }
            let idx = graph.add_node(component.instance_id.clone());
            indices.insert(component.instance_id.clone(), idx);
        }

        let mut seen: HashSet<(String, String, ConnectionPointType, String, String)> =
            HashSet::new();

        for (declarer, conn) in design.connections() {
            if conn.from_instance_id == conn.to_instance_id {
                return Err(MalformedDesignError::SelfConnection {
                    instance_id: conn.from_instance_id.clone(),
                });
            }

            let (Some(&from_idx), Some(&to_idx)) = (
                indices.get(&conn.from_instance_id),
                indices.get(&conn.to_instance_id),
            ) else {
                let missing_id = if indices.contains_key(&conn.from_instance_id) {
                    conn.to_instance_id.clone()
                } else {
                    conn.from_instance_id.clone()
                };
                return Err(MalformedDesignError::DanglingReference {
                    declared_on: declarer.instance_id.clone(),
                    missing_id,
                });
            };

            let point_owner = resolve_point_owner(design, catalog, conn)?;
            let edge = DesignEdge {
                from: conn.from_instance_id.clone(),
                to: conn.to_instance_id.clone(),
                connection_type: conn.connection_type,
                connection_point: conn.connection_point.clone(),
                point_owner,
            };

            // The same connection is often declared on both endpoints.
            let [low, high] = edge.endpoints();
            let key = (
                low.to_string(),
                high.to_string(),
                edge.connection_type,
                edge.connection_point.clone(),
                edge.point_owner.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            graph.add_edge(from_idx, to_idx, edge);
        }

        tracing::debug!(
            "Built design graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self { graph, indices })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.indices.contains_key(instance_id)
    }

    /// Instance ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    /// Edges in the order their connections were first declared.
    pub fn edges(&self) -> impl Iterator<Item = &DesignEdge> {
        self.graph.edge_weights()
    }

    /// Edges touching `instance_id`, in declaration order.
    pub fn edges_of(&self, instance_id: &str) -> Vec<&DesignEdge> {
        let Some(&idx) = self.indices.get(instance_id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges(idx).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    /// Distinct neighbours of `instance_id` in ascending id order.
    pub fn neighbors(&self, instance_id: &str) -> Vec<&str> {
        let Some(&idx) = self.indices.get(instance_id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn resolve_point_owner(
    design: &Design,
    catalog: &Catalog,
    conn: &Connection,
) -> Result<String, MalformedDesignError> {
    let mut missing_component = None;

    for instance_id in [&conn.to_instance_id, &conn.from_instance_id] {
        let Some(instance) = design.component(instance_id) else {
            continue;
        };
        match catalog.get(&instance.component_id) {
            Some(entry) if entry.connection_point(&conn.connection_point).is_some() => {
                return Ok(instance_id.clone());
            }
            Some(_) => {}
            None => {
                missing_component.get_or_insert_with(|| MalformedDesignError::UnknownComponent {
                    instance_id: instance_id.clone(),
                    component_id: instance.component_id.clone(),
                });
            }
        }
    }

    Err(missing_component.unwrap_or_else(|| MalformedDesignError::UnknownConnectionPoint {
        from_instance_id: conn.from_instance_id.clone(),
        to_instance_id: conn.to_instance_id.clone(),
        connection_point: conn.connection_point.clone(),
    }))
}

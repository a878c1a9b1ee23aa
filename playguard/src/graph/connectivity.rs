//! Connectivity Analyzer
//!
//! Breadth-first reachability from anchor instances (structurally grounded
//! components). Neighbours are visited in ascending instance id order so the
//! visit order is reproducible across runs.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use super::DesignGraph;
use crate::catalog::Catalog;
use crate::design::Design;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityResult {
    pub anchors: BTreeSet<String>,
    pub reachable: BTreeSet<String>,
    pub orphans: BTreeSet<String>,
    /// Order in which the traversal first reached each instance.
    pub visit_order: Vec<String>,
}

impl ConnectivityResult {
    pub fn is_reachable(&self, instance_id: &str) -> bool {
        self.reachable.contains(instance_id)
    }

    pub fn is_anchor(&self, instance_id: &str) -> bool {
        self.anchors.contains(instance_id)
    }
}

pub struct ConnectivityAnalyzer;

impl ConnectivityAnalyzer {
    pub fn analyze(design: &Design, catalog: &Catalog, graph: &DesignGraph) -> ConnectivityResult {
        // Instances without a catalog entry never anchor anything.
        let anchors: BTreeSet<String> = design
            .components
            .iter()
            .filter(|c| catalog.get(&c.component_id).is_some_and(|e| e.is_anchor()))
            .map(|c| c.instance_id.clone())
            .collect();

        let mut reachable = BTreeSet::new();
        let mut visit_order = Vec::new();

        for anchor in &anchors {
            if reachable.contains(anchor) {
                continue;
            }
            let mut queue = VecDeque::new();
            reachable.insert(anchor.clone());
            visit_order.push(anchor.clone());
            queue.push_back(anchor.as_str());

            while let Some(current) = queue.pop_front() {
                for neighbor in graph.neighbors(current) {
                    if reachable.insert(neighbor.to_string()) {
                        visit_order.push(neighbor.to_string());
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        let orphans: BTreeSet<String> = graph
            .node_ids()
            .filter(|id| !reachable.contains(*id))
            .map(str::to_string)
            .collect();

        tracing::debug!(
            "Connectivity: {} anchors, {} reachable, {} orphans",
            anchors.len(),
            reachable.len(),
            orphans.len()
        );

        ConnectivityResult {
            anchors,
            reachable,
            orphans,
            visit_order,
        }
    }

    /// Every instance connected to `start` by any path, including `start`.
    pub fn component_of(graph: &DesignGraph, start: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        if !graph.contains(start) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start.to_string());
        while let Some(current) = queue.pop_front() {
            for neighbor in graph.neighbors(current) {
                if seen.insert(neighbor.to_string()) {
                    queue.push_back(neighbor);
                }
            }
        }
        seen
    }
}

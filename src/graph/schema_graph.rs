//! Schema Reference Graph
//!
//! Directed multigraph over registered object types: an edge `A -> B`
//! keyed by field name `F` exists iff field `F` of type `A` lists `B`
//! among its resolved reference targets. Purely derived data, rebuilt
//! from the registry at any time; immutable once built.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;

/// Type-level reference graph
pub struct SchemaGraph {
    graph: DiGraph<String, String>,
    node_indices: HashMap<String, NodeIndex>,
}

impl SchemaGraph {
    /// Build the graph from a validated registry.
    ///
    /// Every declared reference target must itself be a registered
    /// type; a miss means the dictionary is internally inconsistent and
    /// fails the build with `SchemaError::Integrity`.
    pub fn build(registry: &SchemaRegistry) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(registry.len(), registry.len() * 2);
        let mut node_indices = HashMap::with_capacity(registry.len());

        for schema in registry.iter() {
            let idx = graph.add_node(schema.type_name.clone());
            node_indices.insert(schema.type_name.clone(), idx);
        }

        for schema in registry.iter() {
            let source_idx = node_indices[&schema.type_name];
            for field in schema.fields() {
                for target in &field.valid_objects {
                    let target_name = target.to_uppercase();
                    let target_idx = *node_indices.get(&target_name).ok_or_else(|| {
                        SchemaError::Integrity {
                            type_name: schema.type_name.clone(),
                            field: field.name.clone(),
                            target: target.clone(),
                        }
                    })?;

                    // One edge per (source, target, field); the source
                    // dictionary may repeat a target across tag sets
                    let exists = graph
                        .edges_connecting(source_idx, target_idx)
                        .any(|e| e.weight() == &field.name);
                    if !exists {
                        graph.add_edge(source_idx, target_idx, field.name.clone());
                    }
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "schema graph built"
        );
        Ok(Self {
            graph,
            node_indices,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.node_indices.contains_key(&type_name.to_uppercase())
    }

    /// Types this type may reference, with the referring field names
    pub fn references(&self, type_name: &str) -> Vec<(&str, &str)> {
        self.labeled_neighbors(type_name, Direction::Outgoing)
    }

    /// Types that may reference this type, with the referring field names
    pub fn referenced_by(&self, type_name: &str) -> Vec<(&str, &str)> {
        self.labeled_neighbors(type_name, Direction::Incoming)
    }

    /// Field names connecting one (source, target) type pair
    pub fn edge_fields(&self, source: &str, target: &str) -> Vec<&str> {
        let (Some(&source_idx), Some(&target_idx)) = (
            self.node_indices.get(&source.to_uppercase()),
            self.node_indices.get(&target.to_uppercase()),
        ) else {
            return Vec::new();
        };

        self.graph
            .edges_connecting(source_idx, target_idx)
            .map(|e| e.weight().as_str())
            .collect()
    }

    fn labeled_neighbors(&self, type_name: &str, direction: Direction) -> Vec<(&str, &str)> {
        let Some(&idx) = self.node_indices.get(&type_name.to_uppercase()) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(idx, direction)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.graph
                    .node_weight(other)
                    .map(|name| (name.as_str(), e.weight().as_str()))
            })
            .collect()
    }

    /// Export to GraphViz DOT for external visualization
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph SchemaGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=rounded, fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n\n");

        // Names double as node ids; quoting keeps them valid DOT and
        // avoids collapsing distinct names into one sanitized id
        for type_name in self.graph.node_weights() {
            output.push_str(&format!("  \"{type_name}\";\n"));
        }
        output.push('\n');

        for edge in self.graph.edge_references() {
            if let (Some(source), Some(target)) = (
                self.graph.node_weight(edge.source()),
                self.graph.node_weight(edge.target()),
            ) {
                output.push_str(&format!(
                    "  \"{source}\" -> \"{target}\" [label=\"{}\"];\n",
                    edge.weight()
                ));
            }
        }

        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RawTypeBlock;
    use serde_json::{json, Value};

    fn block(entries: Value) -> RawTypeBlock {
        entries
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e.as_object().unwrap().clone())
            .collect()
    }

    fn registry_with_reference() -> SchemaRegistry {
        SchemaRegistry::ingest(vec![
            block(json!([
                { "idfobj": "Zone", "group": "Thermal Zones" },
                { "field": ["Name"], "reference": ["ZoneNames"] }
            ])),
            block(json!([
                { "idfobj": "BuildingSurface:Detailed", "group": "Surfaces" },
                { "field": ["Name"] },
                {
                    "field": ["Zone Name"],
                    "object-list": ["ZoneNames"],
                    "validobjects": ["Zone"]
                }
            ])),
        ])
        .unwrap()
    }

    #[test]
    fn builds_one_edge_per_field_target() {
        let registry = registry_with_reference();
        let graph = SchemaGraph::build(&registry).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.references("BUILDINGSURFACE:DETAILED"),
            vec![("ZONE", "Zone Name")]
        );
        assert_eq!(
            graph.referenced_by("zone"),
            vec![("BUILDINGSURFACE:DETAILED", "Zone Name")]
        );
        assert_eq!(
            graph.edge_fields("BuildingSurface:Detailed", "Zone"),
            vec!["Zone Name"]
        );
    }

    #[test]
    fn missing_target_type_is_an_integrity_error() {
        let registry = SchemaRegistry::ingest(vec![block(json!([
            { "idfobj": "Surface", "group": "Surfaces" },
            { "field": ["Zone Name"], "validobjects": ["Zone"] }
        ]))])
        .unwrap();

        let result = SchemaGraph::build(&registry);
        assert!(matches!(result, Err(SchemaError::Integrity { .. })));
    }

    #[test]
    fn same_field_same_pair_collapses_to_one_edge() {
        let registry = SchemaRegistry::ingest(vec![
            block(json!([
                { "idfobj": "Zone", "group": "G" },
                { "field": ["Name"], "reference": ["ZoneNames"] }
            ])),
            block(json!([
                { "idfobj": "Surface", "group": "G" },
                {
                    "field": ["Zone Name"],
                    "validobjects": ["Zone", "ZONE"]
                }
            ])),
        ])
        .unwrap();

        let graph = SchemaGraph::build(&registry).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let registry = registry_with_reference();
        let a = SchemaGraph::build(&registry).unwrap();
        let b = SchemaGraph::build(&registry).unwrap();

        assert_eq!(a.node_count(), b.node_count());
        assert_eq!(a.edge_count(), b.edge_count());
        assert_eq!(a.to_dot(), b.to_dot());
    }

    #[test]
    fn dot_export_names_every_type() {
        let registry = registry_with_reference();
        let graph = SchemaGraph::build(&registry).unwrap();
        let dot = graph.to_dot();
        assert!(dot.contains("\"ZONE\""));
        assert!(dot.contains("\"BUILDINGSURFACE:DETAILED\""));
        assert!(dot.contains("Zone Name"));
    }

    #[test]
    fn dot_ids_keep_similar_names_distinct() {
        // These names differ only in punctuation; sanitizing punctuation
        // to '_' would merge them into one DOT node
        let registry = SchemaRegistry::ingest(vec![
            block(json!([
                { "idfobj": "Schedule:Compact", "group": "Schedules" },
                { "field": ["Name"] }
            ])),
            block(json!([
                { "idfobj": "Schedule Compact", "group": "Schedules" },
                { "field": ["Name"] }
            ])),
        ])
        .unwrap();

        let dot = SchemaGraph::build(&registry).unwrap().to_dot();
        assert!(dot.contains("\"SCHEDULE:COMPACT\";"));
        assert!(dot.contains("\"SCHEDULE COMPACT\";"));
    }
}

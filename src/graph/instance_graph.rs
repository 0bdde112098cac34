//! Instance Reference Graph
//!
//! Resolves object-to-object references in a concrete model purely from
//! field values matching other objects' names, and stores the result as
//! a directed multigraph.
//!
//! Storage convention: edges are stored REVERSED relative to semantic
//! reference direction. If object X's field references object Y, the
//! graph holds an edge `Y -> X`, so that successors of Y answer the
//! intended query "what refers to Y". [`InstanceGraph::referenced_by`]
//! and [`InstanceGraph::references`] encapsulate the convention.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AmbiguityPolicy;
use crate::error::InstanceError;
use crate::graph::diagnostics::Diagnostics;
use crate::instance::{Extraction, InstanceNode, NameIndex, NodeId, NAME_FIELD};
use crate::registry::SchemaRegistry;

/// Edge metadata: the referring field and the (source type, target type)
/// pair in semantic direction, useful for distinguishing multi-edges
/// (e.g. a day schedule used by several week schedules).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLabel {
    pub field: String,
    pub type_pair: (String, String),
}

/// Builds an [`InstanceGraph`] from an extraction, with configurable
/// handling of ambiguous name matches.
pub struct InstanceGraphBuilder<'a> {
    registry: Option<&'a SchemaRegistry>,
    ambiguity: AmbiguityPolicy,
}

impl Default for InstanceGraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> InstanceGraphBuilder<'a> {
    pub fn new() -> Self {
        Self {
            registry: None,
            ambiguity: AmbiguityPolicy::Drop,
        }
    }

    /// Supply a schema registry, required by `SchemaFiltered` ambiguity
    /// handling to consult a field's declared valid target types
    pub fn with_registry(mut self, registry: &'a SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }

    /// Resolve references and build the graph.
    ///
    /// Per field of every node: a value matching no object name is
    /// ordinary data; exactly one match emits an edge; several matches
    /// emit no edge and a diagnostic naming all candidates (never
    /// guess), unless `SchemaFiltered` narrows them to exactly one.
    /// A non-scalar field value aborts the whole build.
    pub fn build(self, extraction: Extraction) -> Result<InstanceGraph, InstanceError> {
        let Extraction {
            nodes,
            index,
            mut diagnostics,
        } = extraction;

        let mut graph: DiGraph<NodeId, EdgeLabel> =
            DiGraph::with_capacity(nodes.len(), nodes.len() * 2);
        let node_indices: Vec<NodeIndex> =
            nodes.iter().map(|node| graph.add_node(node.id)).collect();

        for source in &nodes {
            for (field, value) in &source.fields {
                if field == NAME_FIELD {
                    continue;
                }

                let text = match value {
                    Value::String(s) => s.as_str(),
                    // Numeric values are legal data but names are
                    // strings, so they can never resolve
                    Value::Number(_) => continue,
                    other => {
                        return Err(InstanceError::UnsupportedValue {
                            type_name: source.object_type.clone(),
                            name: source.name.clone(),
                            field: field.clone(),
                            value: other.clone(),
                        })
                    }
                };

                let candidates = index.candidates(text);
                let target = match candidates {
                    [] => continue,
                    [single] => *single,
                    several => {
                        match self.disambiguate(source, field, several, &nodes) {
                            Some(target) => target,
                            None => {
                                warn!(
                                    source = %source.label(),
                                    field = %field,
                                    value = %text,
                                    candidates = several.len(),
                                    "ambiguous reference, no edge emitted"
                                );
                                diagnostics.ambiguous_reference(
                                    &source.label(),
                                    field,
                                    text,
                                    several.iter().map(|id| nodes[id.index()].label()),
                                );
                                continue;
                            }
                        }
                    }
                };

                let target_node = &nodes[target.index()];
                let label = EdgeLabel {
                    field: field.clone(),
                    type_pair: (source.object_type.clone(), target_node.object_type.clone()),
                };

                // Reversed storage: target -> source. One edge per
                // (source, target, field) triple, enforced here rather
                // than left to the graph library.
                let from = node_indices[target.index()];
                let to = node_indices[source.id.index()];
                let exists = graph
                    .edges_connecting(from, to)
                    .any(|e| e.weight().field == label.field);
                if !exists {
                    graph.add_edge(from, to, label);
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "instance graph built"
        );
        Ok(InstanceGraph {
            nodes,
            index,
            graph,
            node_indices,
            diagnostics,
        })
    }

    /// Under `SchemaFiltered`, keep only candidates whose type appears
    /// in the field's declared valid target set; succeed when exactly
    /// one survives. Anything the schema cannot answer stays ambiguous.
    fn disambiguate(
        &self,
        source: &InstanceNode,
        field: &str,
        candidates: &[NodeId],
        nodes: &[InstanceNode],
    ) -> Option<NodeId> {
        if self.ambiguity != AmbiguityPolicy::SchemaFiltered {
            return None;
        }
        let registry = self.registry?;
        let schema = registry.get(&source.object_type).ok()?;
        let field_schema = schema.field(field).ok()?;
        if field_schema.valid_objects.is_empty() {
            return None;
        }

        let valid: Vec<String> = field_schema
            .valid_objects
            .iter()
            .map(|t| t.to_uppercase())
            .collect();

        let mut filtered = candidates.iter().filter(|id| {
            valid.contains(&nodes[id.index()].object_type.to_uppercase())
        });
        match (filtered.next(), filtered.next()) {
            (Some(&only), None) => Some(only),
            _ => None,
        }
    }
}

/// Object-level reference graph, immutable once built
pub struct InstanceGraph {
    nodes: Vec<InstanceNode>,
    index: NameIndex,
    graph: DiGraph<NodeId, EdgeLabel>,
    /// Parallel to `nodes`: arena position -> petgraph index
    node_indices: Vec<NodeIndex>,
    diagnostics: Diagnostics,
}

impl InstanceGraph {
    /// Build with default ambiguity handling (drop, never guess)
    pub fn build(extraction: Extraction) -> Result<Self, InstanceError> {
        InstanceGraphBuilder::new().build(extraction)
    }

    pub fn node(&self, id: NodeId) -> &InstanceNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &InstanceNode> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Find a node by its (type, name) pair
    pub fn find(&self, object_type: &str, name: &str) -> Option<&InstanceNode> {
        self.index.get(object_type, name).map(|id| self.node(id))
    }

    /// Objects whose fields reference this object (successors under the
    /// reversed storage convention)
    pub fn referenced_by(&self, id: NodeId) -> Vec<(&InstanceNode, &EdgeLabel)> {
        self.labeled_neighbors(id, Direction::Outgoing)
    }

    /// Objects this object's fields reference (predecessors under the
    /// reversed storage convention)
    pub fn references(&self, id: NodeId) -> Vec<(&InstanceNode, &EdgeLabel)> {
        self.labeled_neighbors(id, Direction::Incoming)
    }

    /// Non-fatal findings: name collisions carried over from extraction
    /// plus ambiguous references found during resolution
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn labeled_neighbors(
        &self,
        id: NodeId,
        direction: Direction,
    ) -> Vec<(&InstanceNode, &EdgeLabel)> {
        let Some(&idx) = self.node_indices.get(id.index()) else {
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
                    .map(|&node_id| (self.node(node_id), e.weight()))
            })
            .collect()
    }
}

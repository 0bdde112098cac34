//! Instance extraction
//!
//! Turns raw per-object model-file records into nodes with stable,
//! opaque identities and a (type, name) index. Names are only unique
//! within a type in general, and real model files occasionally carry
//! duplicate-named rows, so collisions are collected as diagnostics
//! first and only the final index-consistency check is fatal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::InstanceError;
use crate::graph::diagnostics::Diagnostics;

/// The field every object's display name lives under, when it has one
pub const NAME_FIELD: &str = "Name";

/// One raw object record from the model-file parser: the declared type
/// plus its ordered field values. Values are scalars (string, integer,
/// or float); anything else is a data-integrity failure caught at graph
/// build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObject {
    pub object_type: String,
    pub fields: Vec<(String, Value)>,
}

impl RawObject {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// The declared name, or `None` when this object type carries no
    /// Name field (the external parser's "field not present" signal)
    pub fn name(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == NAME_FIELD)
            .and_then(|(_, value)| value.as_str())
    }
}

/// Opaque, stable identity of one instance node. Decoupled from the
/// display name so duplicate names can never corrupt identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One concrete object instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceNode {
    pub id: NodeId,
    /// Declared name, or a synthesized `"{TYPE}_{counter:03}"`
    pub name: String,
    pub object_type: String,
    /// Ordered raw field values, as delivered by the parser
    pub fields: Vec<(String, Value)>,
}

impl InstanceNode {
    /// Short display label used in diagnostics
    pub fn label(&self) -> String {
        format!("{} '{}'", self.object_type, self.name)
    }
}

/// Index from (type, name) to node, plus a cross-type name index used
/// for reference resolution
#[derive(Debug, Default)]
pub struct NameIndex {
    by_key: HashMap<(String, String), NodeId>,
    by_name: HashMap<String, Vec<NodeId>>,
}

impl NameIndex {
    /// Look up a node by its (type, name) pair
    pub fn get(&self, object_type: &str, name: &str) -> Option<NodeId> {
        self.by_key
            .get(&(object_type.to_string(), name.to_string()))
            .copied()
    }

    /// Every node whose name equals `name`, across all types
    pub fn candidates(&self, name: &str) -> &[NodeId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Result of extracting one model file: the node arena, its name index,
/// and the non-fatal findings gathered along the way
#[derive(Debug)]
pub struct Extraction {
    pub nodes: Vec<InstanceNode>,
    pub index: NameIndex,
    pub diagnostics: Diagnostics,
}

impl Extraction {
    pub fn node(&self, id: NodeId) -> &InstanceNode {
        &self.nodes[id.0]
    }
}

/// Extract instance nodes and build the name index.
///
/// Anonymous objects (no Name field) are named `"{TYPE}_{counter:03}"`
/// with a per-type counter starting at 0 that increments each time the
/// fallback path is taken for that type. (type, name) collisions are
/// reported as diagnostics; if any remain, the index is smaller than
/// the node arena and extraction fails with `InconsistentIndex` rather
/// than handing out an index that silently drops objects.
pub fn extract<I>(records: I) -> Result<Extraction, InstanceError>
where
    I: IntoIterator<Item = RawObject>,
{
    let mut nodes = Vec::new();
    let mut index = NameIndex::default();
    let mut diagnostics = Diagnostics::new();
    let mut anonymous_counts: HashMap<String, usize> = HashMap::new();

    for record in records {
        let id = NodeId(nodes.len());
        let name = match record.name() {
            Some(name) => name.to_string(),
            None => {
                let counter = anonymous_counts
                    .entry(record.object_type.clone())
                    .and_modify(|c| *c += 1)
                    .or_insert(0);
                format!("{}_{:03}", record.object_type, counter)
            }
        };

        let node = InstanceNode {
            id,
            name,
            object_type: record.object_type,
            fields: record.fields,
        };

        let key = (node.object_type.clone(), node.name.clone());
        if index.by_key.contains_key(&key) {
            warn!(object_type = %node.object_type, name = %node.name, "duplicate (type, name) pair, not indexed");
            diagnostics.name_collision(&node.object_type, &node.name);
        } else {
            index.by_key.insert(key, id);
            index
                .by_name
                .entry(node.name.clone())
                .or_default()
                .push(id);
        }

        nodes.push(node);
    }

    if index.by_key.len() != nodes.len() {
        return Err(InstanceError::InconsistentIndex {
            node_count: nodes.len(),
            index_count: index.by_key.len(),
            collisions: diagnostics.to_string(),
        });
    }

    debug!(nodes = nodes.len(), "instances extracted");
    Ok(Extraction {
        nodes,
        index,
        diagnostics,
    })
}

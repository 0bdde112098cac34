//! Schema Registry
//!
//! Ingests raw per-type dictionary blocks into a validated, strongly
//! typed registry keyed by upper-cased type name. Construction is
//! all-or-nothing: one malformed attribute anywhere aborts the build,
//! because graph construction downstream assumes a fully consistent
//! registry.

use std::collections::{BTreeMap, HashMap};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::{BuildConfig, DuplicatePolicy};
use crate::error::{Result, SchemaError};
use crate::graph::diagnostics::Diagnostics;
use crate::normalize;
use crate::schema::{FieldSchema, ObjectHeader, ObjectSchema};

/// One raw type block from the dictionary parser: the first entry holds
/// header attributes (the type's own name under `"idfobj"`), each later
/// entry describes one field (distinguished by a `"field"` key).
pub type RawTypeBlock = Vec<Map<String, Value>>;

/// A fuzzy search hit over registered type names
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub schema: &'a ObjectSchema,
    pub score: i64,
}

/// Validated registry of object type definitions
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<String, ObjectSchema>,
    /// Registration order, for deterministic iteration
    order: Vec<String>,
    /// Group name -> type names, in registration order per group
    groups: BTreeMap<String, Vec<String>>,
    /// SHA-256 over the raw blocks, for rebuild detection
    fingerprint: String,
    diagnostics: Diagnostics,
}

impl SchemaRegistry {
    /// Ingest raw type blocks with the default configuration
    pub fn ingest<I>(blocks: I) -> Result<Self>
    where
        I: IntoIterator<Item = RawTypeBlock>,
    {
        Self::ingest_with(blocks, &BuildConfig::default())
    }

    /// Ingest raw type blocks.
    ///
    /// Fails on the first validation violation; no partial registry is
    /// ever returned.
    pub fn ingest_with<I>(blocks: I, config: &BuildConfig) -> Result<Self>
    where
        I: IntoIterator<Item = RawTypeBlock>,
    {
        let mut schemas = HashMap::new();
        let mut order = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let mut hasher = Sha256::new();

        for block in blocks {
            let schema = build_schema(&block)?;
            let type_name = schema.type_name.clone();

            let raw = serde_json::to_vec(&block).map_err(|e| {
                SchemaError::validation(&type_name, format!("block not serializable: {e}"))
            })?;
            hasher.update(raw);

            if schemas.contains_key(&type_name) {
                match config.duplicate_types {
                    DuplicatePolicy::Reject => {
                        return Err(SchemaError::DuplicateType { type_name });
                    }
                    DuplicatePolicy::LastWins => {
                        warn!(type_name = %type_name, "type registered twice, replacing earlier definition");
                        diagnostics.type_overwritten(&type_name);
                        // Keep the original position in registration order
                        schemas.insert(type_name, schema);
                    }
                }
            } else {
                order.push(type_name.clone());
                schemas.insert(type_name, schema);
            }
        }

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for type_name in &order {
            let group = schemas[type_name].header.group.clone();
            groups.entry(group).or_default().push(type_name.clone());
        }

        let fingerprint = format!("{:x}", hasher.finalize());
        debug!(types = order.len(), groups = groups.len(), "registry ingested");

        Ok(Self {
            schemas,
            order,
            groups,
            fingerprint,
            diagnostics,
        })
    }

    /// Look up a type definition; the name is case-normalized first
    pub fn get(&self, type_name: &str) -> Result<&ObjectSchema> {
        self.schemas
            .get(&type_name.to_uppercase())
            .ok_or_else(|| SchemaError::NotFound {
                type_name: type_name.to_string(),
            })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(&type_name.to_uppercase())
    }

    /// Iterate all type definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectSchema> {
        self.order.iter().map(|name| &self.schemas[name])
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All group names, sorted
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Type definitions belonging to one group, in registration order
    pub fn schemas_in_group(&self, group: &str) -> Vec<&ObjectSchema> {
        self.groups
            .get(group)
            .map(|names| names.iter().map(|n| &self.schemas[n]).collect())
            .unwrap_or_default()
    }

    /// Fuzzy-search type names, best matches first
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        let matcher = SkimMatcherV2::default();
        let mut hits: Vec<SearchHit<'_>> = self
            .iter()
            .filter_map(|schema| {
                matcher
                    .fuzzy_match(&schema.type_name, query)
                    .map(|score| SearchHit { schema, score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    /// SHA-256 over the ingested raw blocks
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Non-fatal findings from ingestion (type overwrites)
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Validate and type one raw block
fn build_schema(block: &RawTypeBlock) -> Result<ObjectSchema> {
    let header_entry = block.first().ok_or_else(|| {
        SchemaError::validation("<unnamed>", "type block holds no entries")
    })?;

    let type_name = match header_entry.get("idfobj") {
        Some(v) => normalize::singleton(v)
            .map_err(|e| SchemaError::validation("<unnamed>", format!("idfobj: {e}")))?,
        None => {
            return Err(SchemaError::validation(
                "<unnamed>",
                "type block header is missing its 'idfobj' attribute",
            ))
        }
    };

    // Extensibility markers are header keys of the form "extensible:N";
    // they are pulled out of the generic attribute set and parsed apart.
    let mut header_attrs = Map::new();
    let mut extensible_keys = Vec::new();
    for (key, value) in header_entry {
        if key.to_lowercase().contains("extensible") {
            extensible_keys.push(key.clone());
        } else {
            header_attrs.insert(key.clone(), value.clone());
        }
    }

    if extensible_keys.len() > 1 {
        return Err(SchemaError::validation(
            &type_name,
            format!(
                "a type may declare only one 'extensible:N' key, found: {}",
                extensible_keys.join(", ")
            ),
        ));
    }

    let extensible = match extensible_keys.first() {
        Some(key) => {
            let index = key
                .rsplit(':')
                .next()
                .and_then(|suffix| suffix.trim().parse::<usize>().ok())
                .ok_or_else(|| {
                    SchemaError::validation(
                        &type_name,
                        format!("malformed extensibility marker '{key}', expected 'extensible:N'"),
                    )
                })?;
            Some(index)
        }
        None => None,
    };

    let mut header = ObjectHeader::from_raw(&type_name, &header_attrs)?;
    header.extensible = extensible;

    let mut schema = ObjectSchema::new(&type_name, header);
    for entry in &block[1..] {
        if entry.contains_key("field") {
            schema.push_field(FieldSchema::from_raw(&schema.type_name, entry)?)?;
        }
    }

    Ok(schema)
}

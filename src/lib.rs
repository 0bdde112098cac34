//! idfgraph
//!
//! Reference graphs for EnergyPlus model files (IDF) and their data
//! dictionary (IDD). Upstream parsers tokenize the text formats and hand
//! this crate raw attribute records; from those it builds two linked,
//! read-only graphs:
//!
//! - a **schema graph** over object *types*: which fields of type A may
//!   reference which other types, derived from a validated
//!   [`SchemaRegistry`];
//! - an **instance graph** over concrete *objects*: which objects in one
//!   model actually reference which others, resolved purely by field
//!   values matching object names, with collision and ambiguity
//!   diagnostics instead of guesses.
//!
//! ## Pipeline
//!
//! ```text
//! raw IDD blocks --> SchemaRegistry --> SchemaGraph
//! raw IDF records --> extract() --> Extraction --> InstanceGraph
//! ```
//!
//! Both pipelines are batch and deterministic: each artifact is built
//! once per input and immutable afterwards. Registry and schema-graph
//! problems are fatal (no partial results); instance-level name
//! collisions and ambiguous references degrade to [`Diagnostics`].

pub mod config;
pub mod error;
pub mod graph;
pub mod instance;
pub mod normalize;
pub mod registry;
pub mod schema;

pub use config::{AmbiguityPolicy, BuildConfig, DuplicatePolicy};
pub use error::{InstanceError, Result, SchemaError};
pub use graph::{
    DiagnosticCode, DiagnosticItem, Diagnostics, EdgeLabel, InstanceGraph, InstanceGraphBuilder,
    SchemaGraph, Severity,
};
pub use instance::{extract, Extraction, InstanceNode, NameIndex, NodeId, RawObject};
pub use registry::{RawTypeBlock, SchemaRegistry, SearchHit};
pub use schema::{FieldSchema, ObjectHeader, ObjectSchema};

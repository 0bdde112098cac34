//! Reference graphs
//!
//! Two petgraph multigraphs derived from the same parsed inputs: the
//! schema graph relates object *types* ("field F of type A may reference
//! type B") and the instance graph relates concrete *objects* resolved by
//! name matching. They share type-name strings but nothing else.

pub mod diagnostics;
pub mod instance_graph;
pub mod schema_graph;

pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use instance_graph::{EdgeLabel, InstanceGraph, InstanceGraphBuilder};
pub use schema_graph::SchemaGraph;

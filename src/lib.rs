//! Schemagraph
//!
//! An in-memory, schema-governed graph store. A declarative schema fixes the
//! node types, their (inherited) properties and the secondary indexes; every
//! mutation is expressed as a command, translated into a self-describing
//! operation that carries its own pre-state, and applied through an
//! interceptor chain that can mirror nodes into a key-value store or record
//! an operation history.
//!
//! ## Example Usage
//!
//! ```rust
//! use schemagraph::{Graph, Schema, SchemaDefinition};
//! use serde_json::json;
//!
//! let definition = SchemaDefinition::new()
//!     .with_type("Person", None, [("name", "string")])
//!     .with_index("by_name", "Person", &["name"]);
//! let mut graph = Graph::new(Schema::new(definition).unwrap());
//!
//! graph.create(json!({"id": "p1", "type": "Person", "name": "Ann"})).unwrap();
//! assert_eq!(graph.find("by_name", Some("Ann")).len(), 1);
//!
//! graph.set(["p1", "name"], "Bea").unwrap();
//! assert!(graph.find("by_name", Some("Ann")).is_empty());
//! assert_eq!(graph.find("by_name", Some("Bea"))[0].id.as_str(), "p1");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod command;
pub mod config;
pub mod graph;
pub mod index;
pub mod operation;
pub mod schema;

// Re-export main types for convenience
pub use adapter::{
    GraphInterceptor, History, KeyValueStore, MemoryHistory, MemoryKeyValueStore,
    PersistenceInterceptor, VersioningInterceptor,
};
pub use command::{Command, CommandKind};
pub use config::{ConfigError, GraphConfig, MergePolicy};
pub use graph::{
    Graph, GraphBuilder, GraphError, GraphResult, GraphSnapshot, Mutation, Node, NodeFactory, NodeId,
    Path, PathSegment, PropertyMap, PropertyValue, QueryResult, TypeName,
};
pub use index::{GraphIndex, IndexManager};
pub use operation::{ApplyTarget, ArrayEdit, Diff, GraphOperation, ObjectEdit, TextEdit};
pub use schema::{
    PropertyType, PropertyTypeSpec, Schema, SchemaDefinition, SchemaError, SchemaResult, TypeTag,
    ValueTag,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

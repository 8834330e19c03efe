//! Core graph data model
//!
//! This module implements the schema-governed node store:
//! - Nodes whose property set is fixed by their schema type
//! - Path addressing into nodes, nested values and references
//! - Incremental index maintenance driven by change events
//! - The `Graph` façade tying commands, operations and interceptors together

pub mod error;
pub mod event;
pub mod node;
pub mod path;
pub mod property;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export main types
pub use error::{GraphError, GraphResult};
pub use event::IndexEvent;
pub use node::{Node, NodeFactory};
pub use path::{Path, PathSegment};
pub use property::{PropertyMap, PropertyValue};
pub use resolver::{resolve, PreparedSet, PropertyRef, ResolveStep};
pub use store::{Graph, GraphBuilder, GraphSnapshot, Mutation, QueryResult};
pub use types::{NodeId, TypeName};

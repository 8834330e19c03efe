//! Errors that can occur during graph operations

use super::path::Path;
use super::types::NodeId;
use crate::schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Node must have both an id and a type")]
    MissingIdOrType,

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Key error: could not resolve path {0}")]
    KeyError(Path),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported property type for {operation}: {property_type}")]
    UnsupportedPropertyType {
        operation: String,
        property_type: String,
    },

    #[error("Node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("Node {node} is missing property '{property}' required by index '{index}'")]
    MissingIndexedProperty {
        index: String,
        property: String,
        node: NodeId,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid diff: {0}")]
    InvalidDiff(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Serialization(e.to_string())
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

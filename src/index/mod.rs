//! Secondary indexes
//!
//! Provides flat and grouped node-id indexes declared by the schema.

pub mod graph_index;
pub mod manager;

pub use graph_index::GraphIndex;
pub use manager::IndexManager;

//! The schema-governed graph
//!
//! `Graph` owns the node table and the index manager. Mutations arrive as
//! commands, are translated into self-describing operations and are then
//! applied through a private apply step that keeps the node table and the
//! indexes in lockstep before handing the result to the interceptor chain.

use super::error::{GraphError, GraphResult};
use super::event::IndexEvent;
use super::node::Node;
use super::path::Path;
use super::property::PropertyValue;
use super::resolver::resolve;
use super::types::NodeId;
use crate::adapter::{GraphInterceptor, InterceptorChain, MemoryHistory, VersioningInterceptor};
use crate::command::{translate, Command};
use crate::config::{GraphConfig, MergePolicy};
use crate::index::IndexManager;
use crate::operation::{ApplyTarget, GraphOperation};
use crate::schema::{PropertyType, Schema, TypeTag};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anything `Graph::exec` accepts, at whatever stage of the edit it is in
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Command in wire notation, not yet normalized
    Spec(serde_json::Value),
    Command(Command),
    Operation(GraphOperation),
}

impl From<serde_json::Value> for Mutation {
    fn from(spec: serde_json::Value) -> Self {
        Mutation::Spec(spec)
    }
}

impl From<Command> for Mutation {
    fn from(command: Command) -> Self {
        Mutation::Command(command)
    }
}

impl From<GraphOperation> for Mutation {
    fn from(operation: GraphOperation) -> Self {
        Mutation::Operation(operation)
    }
}

/// Result of `get` and `query`
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<'g> {
    Node(&'g Node),
    Value(PropertyValue),
    /// Elements of an array of references, in array order
    List(Vec<QueryResult<'g>>),
}

impl<'g> QueryResult<'g> {
    pub fn as_node(&self) -> Option<&'g Node> {
        match self {
            QueryResult::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&PropertyValue> {
        match self {
            QueryResult::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Every node in the result, depth first
    pub fn nodes(&self) -> Vec<&'g Node> {
        match self {
            QueryResult::Node(node) => vec![*node],
            QueryResult::Value(_) => Vec::new(),
            QueryResult::List(items) => items.iter().flat_map(QueryResult::nodes).collect(),
        }
    }

    /// Plain value form; nodes become objects
    pub fn into_value(self) -> PropertyValue {
        match self {
            QueryResult::Node(node) => node.to_value(),
            QueryResult::Value(value) => value,
            QueryResult::List(items) => {
                PropertyValue::Array(items.into_iter().map(QueryResult::into_value).collect())
            }
        }
    }
}

/// Serializable copy of a graph's nodes, in insertion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
}

/// Builder for graphs with interceptors
pub struct GraphBuilder {
    schema: Arc<Schema>,
    config: GraphConfig,
    interceptors: InterceptorChain,
}

impl GraphBuilder {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            config: GraphConfig::default(),
            interceptors: InterceptorChain::new(),
        }
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an interceptor; interceptors run in registration order,
    /// before the built-in history
    pub fn interceptor(mut self, interceptor: impl GraphInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn build(self) -> Graph {
        let GraphBuilder { schema, config, mut interceptors } = self;
        let history = if config.record_history {
            let history = MemoryHistory::new();
            interceptors.push(Box::new(VersioningInterceptor::new(history.clone())));
            Some(history)
        } else {
            None
        };

        let indexes = IndexManager::new(&schema);
        info!(
            "Created graph with {} types, {} indexes and interceptors {:?}",
            schema.type_names().count(),
            schema.indexes().count(),
            interceptors.names()
        );

        Graph {
            schema,
            config,
            nodes: IndexMap::new(),
            indexes,
            interceptors,
            history,
        }
    }
}

/// Schema-governed in-memory graph
#[derive(Debug)]
pub struct Graph {
    schema: Arc<Schema>,
    config: GraphConfig,
    /// Node table, in insertion order
    nodes: IndexMap<NodeId, Node>,
    indexes: IndexManager,
    interceptors: InterceptorChain,
    history: Option<MemoryHistory>,
}

impl Graph {
    /// Create an empty graph with the default configuration
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        GraphBuilder::new(schema).build()
    }

    pub fn with_config(schema: impl Into<Arc<Schema>>, config: GraphConfig) -> Self {
        GraphBuilder::new(schema).config(config).build()
    }

    pub fn builder(schema: impl Into<Arc<Schema>>) -> GraphBuilder {
        GraphBuilder::new(schema)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Interceptors in the order they run
    pub fn interceptor_names(&self) -> Vec<&str> {
        self.interceptors.names()
    }

    /// Operations recorded since construction or the last reset
    pub fn history(&self) -> Option<&MemoryHistory> {
        self.history.as_ref()
    }

    /// Normalize, translate and apply a mutation, returning the applied operation
    pub fn exec(&mut self, mutation: impl Into<Mutation>) -> GraphResult<GraphOperation> {
        let operation = match mutation.into() {
            Mutation::Spec(spec) => self.translate(&Command::normalize(spec)?)?,
            Mutation::Command(command) => self.translate(&command)?,
            Mutation::Operation(operation) => operation,
        };
        self.apply(operation)
    }

    /// Translate a command against the current state without applying it
    pub fn translate(&self, command: &Command) -> GraphResult<GraphOperation> {
        translate(&self.schema, &self.nodes, command)
    }

    /// Apply an already translated operation
    pub fn apply(&mut self, operation: GraphOperation) -> GraphResult<GraphOperation> {
        debug!("Applying {} at {}", operation.name(), operation.path());
        let mut applier = Applier {
            schema: &self.schema,
            nodes: &mut self.nodes,
            indexes: &mut self.indexes,
            interceptors: &mut self.interceptors,
        };
        operation.apply(&mut applier)?;
        self.interceptors.on_applied(&operation)?;
        Ok(operation)
    }

    /// Create a node from `raw`, an object holding `id`, `type` and properties
    pub fn create(&mut self, raw: impl Into<PropertyValue>) -> GraphResult<GraphOperation> {
        self.exec(Command::create(raw))
    }

    pub fn delete(&mut self, id: impl Into<NodeId>) -> GraphResult<GraphOperation> {
        self.exec(Command::delete(id))
    }

    pub fn set(&mut self, path: impl Into<Path>, value: impl Into<PropertyValue>) -> GraphResult<GraphOperation> {
        self.exec(Command::set(path, value))
    }

    pub fn update(&mut self, path: impl Into<Path>, args: impl Into<PropertyValue>) -> GraphResult<GraphOperation> {
        self.exec(Command::update(path, args))
    }

    /// Node for a single-segment path, otherwise the value at `path`
    pub fn get(&self, path: impl Into<Path>) -> GraphResult<QueryResult<'_>> {
        let path = path.into();
        if path.len() == 1 {
            if let Some(segment) = path.first() {
                let id = segment.as_key();
                return self
                    .nodes
                    .get(&*id)
                    .map(QueryResult::Node)
                    .ok_or_else(|| GraphError::NodeNotFound(NodeId::new(id.into_owned())));
            }
        }

        let property = resolve(&self.schema, &self.nodes, &path)?;
        match property.value {
            Some(value) => Ok(QueryResult::Value(value)),
            None => self
                .nodes
                .get(property.node.as_str())
                .map(QueryResult::Node)
                .ok_or(GraphError::NodeNotFound(property.node)),
        }
    }

    /// Like `get`, but references are replaced by the nodes they point at
    pub fn query(&self, path: impl Into<Path>) -> GraphResult<QueryResult<'_>> {
        let path = path.into();
        let property = resolve(&self.schema, &self.nodes, &path)?;
        match property.value {
            Some(value) => self.materialize(&property.property_type, value),
            None => self
                .nodes
                .get(property.node.as_str())
                .map(QueryResult::Node)
                .ok_or(GraphError::NodeNotFound(property.node)),
        }
    }

    fn materialize(&self, property_type: &PropertyType, value: PropertyValue) -> GraphResult<QueryResult<'_>> {
        if !matches!(property_type.tags().last(), Some(TypeTag::Ref(_))) {
            return Ok(QueryResult::Value(value));
        }
        if property_type.reference().is_some() {
            return match value {
                PropertyValue::String(id) => self
                    .nodes
                    .get(id.as_str())
                    .map(QueryResult::Node)
                    .ok_or_else(|| GraphError::NodeNotFound(NodeId::new(id))),
                other => Ok(QueryResult::Value(other)),
            };
        }
        match (property_type.element(), value) {
            (Some(element), PropertyValue::Array(items)) => items
                .into_iter()
                .map(|item| self.materialize(&element, item))
                .collect::<GraphResult<Vec<_>>>()
                .map(QueryResult::List),
            (_, other) => Ok(QueryResult::Value(other)),
        }
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of an ungrouped index, or of one group of a grouped index
    ///
    /// Group keys are the textual form of the grouping value
    /// (see [`PropertyValue::index_key`]). Unknown indexes yield no nodes.
    pub fn find(&self, index: &str, group: Option<&str>) -> Vec<&Node> {
        self.indexes
            .find(index, group)
            .iter()
            .filter_map(|id| self.nodes.get(id.as_str()))
            .collect()
    }

    /// Nodes for an ordered id sequence, in that order
    pub fn traverse<I>(&self, view: I) -> GraphResult<Vec<&Node>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        view.into_iter()
            .map(|id| {
                let id = id.as_ref();
                self.nodes
                    .get(id)
                    .ok_or_else(|| GraphError::NodeNotFound(NodeId::new(id)))
            })
            .collect()
    }

    /// Remove every node and empty every index
    pub fn reset(&mut self) -> GraphResult<()> {
        let count = self.nodes.len();
        self.nodes.clear();
        self.indexes.clear();
        self.interceptors.on_reset()?;
        info!("Reset graph, dropped {} nodes", count);
        Ok(())
    }

    /// Create every node of `other` in this graph, in `other`'s order
    ///
    /// Overlapping ids are handled by the configured [`MergePolicy`]. Every
    /// incoming node is validated before the first one is created.
    pub fn merge(&mut self, other: &Graph) -> GraphResult<usize> {
        let count = self.load(other.nodes().cloned().collect())?;
        info!("Merged {} nodes", count);
        Ok(count)
    }

    pub fn export(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    /// Create the snapshot's nodes, following the merge policy on overlap
    pub fn import(&mut self, snapshot: GraphSnapshot) -> GraphResult<usize> {
        let count = self.load(snapshot.nodes)?;
        info!("Imported {} nodes", count);
        Ok(count)
    }

    fn load(&mut self, incoming: Vec<Node>) -> GraphResult<usize> {
        let policy = self.config.merge_policy;
        let mut operations = Vec::with_capacity(incoming.len());
        let mut seen = std::collections::HashSet::new();

        for node in incoming {
            if !seen.insert(node.id.clone()) {
                return Err(GraphError::DuplicateNode(node.id));
            }
            if self.contains(node.id.as_str()) {
                match policy {
                    MergePolicy::RejectOnConflict => {
                        warn!("Rejected merge: node {} already exists", node.id);
                        return Err(GraphError::DuplicateNode(node.id));
                    }
                    MergePolicy::LastWriterWins => {
                        operations.push(self.translate(&Command::delete(node.id.clone()))?);
                    }
                }
            }
            let create = self.translate(&Command::create(node.to_value()))?;
            if let GraphOperation::Create { node, .. } = &create {
                self.indexes.validate_node(&self.schema, node)?;
            }
            operations.push(create);
        }

        let mut created = 0;
        for operation in operations {
            if matches!(operation, GraphOperation::Create { .. }) {
                created += 1;
            }
            self.apply(operation)?;
        }
        Ok(created)
    }
}

/// The apply step: the only code that mutates the node table
struct Applier<'g> {
    schema: &'g Schema,
    nodes: &'g mut IndexMap<NodeId, Node>,
    indexes: &'g mut IndexManager,
    interceptors: &'g mut InterceptorChain,
}

impl ApplyTarget for Applier<'_> {
    fn get(&self, path: &Path) -> GraphResult<PropertyValue> {
        let property = resolve(self.schema, self.nodes, path)?;
        property
            .get(self.nodes)
            .ok_or_else(|| GraphError::NodeNotFound(property.node.clone()))
    }

    fn create(&mut self, node: Node) -> GraphResult<()> {
        if self.nodes.contains_key(node.id.as_str()) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.schema.type_chain(node.type_name.as_str())?;
        self.indexes.validate_node(self.schema, &node)?;

        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        let node = self
            .nodes
            .get(id.as_str())
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        self.indexes.handle_event(self.schema, IndexEvent::NodeCreated(node));
        debug!("Created node {} of type {}", node.id, node.type_name);
        self.interceptors.on_create(node)
    }

    fn set(&mut self, path: &Path, value: PropertyValue) -> GraphResult<()> {
        let property = resolve(self.schema, self.nodes, path)?;
        let node = self
            .nodes
            .get(property.node.as_str())
            .ok_or_else(|| GraphError::NodeNotFound(property.node.clone()))?;
        let prepared = property.prepare_set(self.schema, node, value)?;
        self.indexes
            .validate_property(self.schema, node, &prepared.top_key, &prepared.new_top)?;

        let node = self
            .nodes
            .get_mut(property.node.as_str())
            .ok_or_else(|| GraphError::NodeNotFound(property.node.clone()))?;
        node.properties.insert(prepared.top_key.clone(), prepared.new_top.clone());
        let node: &Node = node;

        self.indexes.handle_event(
            self.schema,
            IndexEvent::PropertySet {
                id: &node.id,
                type_name: &node.type_name,
                key: &prepared.top_key,
                old_value: &prepared.old_top,
                new_value: &prepared.new_top,
            },
        );
        debug!("Set {} on node {}", path, node.id);
        self.interceptors.on_set(node, path, &prepared.new_value)
    }

    fn delete(&mut self, node: &Node) -> GraphResult<()> {
        let removed = self
            .nodes
            .shift_remove(node.id.as_str())
            .ok_or_else(|| GraphError::NodeNotFound(node.id.clone()))?;
        self.indexes.handle_event(self.schema, IndexEvent::NodeDeleted(&removed));
        debug!("Deleted node {}", removed.id);
        self.interceptors.on_delete(&removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyTypeSpec, SchemaDefinition};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(
            SchemaDefinition::new()
                .with_type(
                    "Person",
                    None,
                    [
                        ("name", PropertyTypeSpec::from("string")),
                        ("age", "number".into()),
                        ("friends", vec!["array", "Person"].into()),
                    ],
                )
                .with_index("by_name", "Person", &["name"])
                .with_index("people", "Person", &[]),
        )
        .unwrap()
    }

    fn graph() -> Graph {
        let mut graph = Graph::with_config(schema(), GraphConfig::default().with_history(true));
        graph.create(json!({"id": "p1", "type": "Person", "name": "Ann"})).unwrap();
        graph.create(json!({"id": "p2", "type": "Person", "name": "Bea", "friends": ["p1"]})).unwrap();
        graph
    }

    #[test]
    fn test_create_and_get() {
        let graph = graph();
        let node = graph.get("p1").unwrap().as_node().unwrap();
        assert_eq!(node.get_property("age"), Some(&PropertyValue::from(0i64)));
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.find("people", None).len(), 2);
    }

    #[test]
    fn test_set_moves_index_bucket() {
        let mut graph = graph();
        graph.set(["p1", "name"], "Cid").unwrap();
        assert!(graph.find("by_name", Some("Ann")).is_empty());
        assert_eq!(graph.find("by_name", Some("Cid"))[0].id, NodeId::new("p1"));
    }

    #[test]
    fn test_failed_set_leaves_state_untouched() {
        let mut graph = graph();
        let err = graph.set(["p1", "age"], "old").unwrap_err();
        assert!(matches!(err, GraphError::Schema(_)));
        assert_eq!(graph.get(["p1", "age"]).unwrap().as_value(), Some(&PropertyValue::from(0i64)));
        assert_eq!(graph.history().map(|h| h.len()), Some(2));
    }

    #[test]
    fn test_query_materializes_references() {
        let graph = graph();
        let result = graph.query(["p2", "friends"]).unwrap();
        let nodes = result.nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, NodeId::new("p1"));

        // plain values pass through unchanged
        let name = graph.query(["p2", "name"]).unwrap();
        assert_eq!(name, QueryResult::Value("Bea".into()));
    }

    #[test]
    fn test_apply_inverse_undoes_operation() {
        let mut graph = graph();
        let op = graph.set(["p1", "name"], "Cid").unwrap();
        graph.apply(op.invert()).unwrap();
        assert_eq!(graph.get(["p1", "name"]).unwrap().as_value(), Some(&PropertyValue::from("Ann")));
        assert_eq!(graph.find("by_name", Some("Ann")).len(), 1);

        let op = graph.delete("p1").unwrap();
        graph.apply(op.invert()).unwrap();
        assert!(graph.contains("p1"));
        assert_eq!(graph.find("by_name", Some("Ann")).len(), 1);
    }

    #[test]
    fn test_exec_accepts_wire_notation() {
        let mut graph = graph();
        let op = graph.exec(json!(["update", "p2", "friends", {"push": "p2"}])).unwrap();
        assert_eq!(op.name(), "update");
        assert_eq!(graph.query(["p2", "friends"]).unwrap().nodes().len(), 2);
    }

    #[test]
    fn test_traverse() {
        let graph = graph();
        let nodes = graph.traverse(["p2", "p1"]).unwrap();
        assert_eq!(nodes[0].id, NodeId::new("p2"));
        assert!(matches!(graph.traverse(["p9"]), Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn test_reset() {
        let mut graph = graph();
        graph.reset().unwrap();
        assert!(graph.is_empty());
        assert!(graph.find("people", None).is_empty());
        assert_eq!(graph.history().map(|h| h.cursor()), Some(0));
    }

    #[test]
    fn test_history_is_opt_in() {
        let mut graph = Graph::new(schema());
        graph.create(json!({"id": "p1", "type": "Person", "name": "Ann"})).unwrap();
        assert!(graph.history().is_none());
        assert!(graph.interceptor_names().is_empty());
    }
}

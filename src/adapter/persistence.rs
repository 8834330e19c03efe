//! Node mirroring into a key-value store
//!
//! Every created or changed node is written under its id as JSON bytes;
//! deleted nodes are removed. The mirror can be read back with
//! [`PersistenceInterceptor::recover`] and loaded into a fresh graph.

use super::GraphInterceptor;
use crate::graph::{GraphError, GraphResult, Node, Path, PropertyValue};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Minimal byte store the persistence interceptor writes through
pub trait KeyValueStore {
    fn put(&mut self, key: &str, value: Vec<u8>) -> GraphResult<()>;
    fn get(&self, key: &str) -> GraphResult<Option<Vec<u8>>>;
    fn delete(&mut self, key: &str) -> GraphResult<()>;
    /// All entries in write order
    fn scan(&self) -> GraphResult<Vec<(String, Vec<u8>)>>;
    fn clear(&mut self) -> GraphResult<()>;
}

/// In-memory store; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<IndexMap<String, Vec<u8>>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().map(|e| e.contains_key(key)).unwrap_or(false)
    }
}

fn poisoned<T>(_: T) -> GraphError {
    GraphError::Adapter("key-value store lock poisoned".to_string())
}

impl KeyValueStore for MemoryKeyValueStore {
    fn put(&mut self, key: &str, value: Vec<u8>) -> GraphResult<()> {
        self.entries.write().map_err(poisoned)?.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> GraphResult<Option<Vec<u8>>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> GraphResult<()> {
        self.entries.write().map_err(poisoned)?.shift_remove(key);
        Ok(())
    }

    fn scan(&self) -> GraphResult<Vec<(String, Vec<u8>)>> {
        Ok(self
            .entries
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn clear(&mut self) -> GraphResult<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// Mirrors every create, set and delete into a [`KeyValueStore`]
#[derive(Debug)]
pub struct PersistenceInterceptor<S: KeyValueStore> {
    store: S,
    /// Clear the store when the graph is reset
    clear_on_reset: bool,
}

impl<S: KeyValueStore> PersistenceInterceptor<S> {
    pub fn new(store: S) -> Self {
        Self { store, clear_on_reset: true }
    }

    /// Keep the mirrored nodes when the graph is reset
    pub fn retain_on_reset(mut self) -> Self {
        self.clear_on_reset = false;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self, node: &Node) -> GraphResult<()> {
        let bytes = serde_json::to_vec(node)?;
        self.store.put(node.id.as_str(), bytes)?;
        debug!("Persisted node {}", node.id);
        Ok(())
    }

    /// Load a single mirrored node
    pub fn load(&self, id: &str) -> GraphResult<Option<Node>> {
        match self.store.get(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read back every mirrored node in write order
    pub fn recover(&self) -> GraphResult<Vec<Node>> {
        let nodes = self
            .store
            .scan()?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice::<Node>(&bytes))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Recovered {} nodes from store", nodes.len());
        Ok(nodes)
    }
}

impl<S: KeyValueStore> GraphInterceptor for PersistenceInterceptor<S> {
    fn name(&self) -> &str {
        "persistence"
    }

    fn on_create(&mut self, node: &Node) -> GraphResult<()> {
        self.persist(node)
    }

    fn on_set(&mut self, node: &Node, _path: &Path, _value: &PropertyValue) -> GraphResult<()> {
        self.persist(node)
    }

    fn on_delete(&mut self, node: &Node) -> GraphResult<()> {
        self.store.delete(node.id.as_str())?;
        debug!("Removed persisted node {}", node.id);
        Ok(())
    }

    fn on_reset(&mut self) -> GraphResult<()> {
        if self.clear_on_reset {
            self.store.clear()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;

    fn node(id: &str, name: &str) -> Node {
        let mut properties = PropertyMap::new();
        properties.insert("name".to_string(), name.into());
        Node {
            id: id.into(),
            type_name: "Person".into(),
            properties,
        }
    }

    #[test]
    fn test_mirror_create_set_delete() {
        let store = MemoryKeyValueStore::new();
        let mut interceptor = PersistenceInterceptor::new(store.clone());

        interceptor.on_create(&node("p1", "Ann")).unwrap();
        interceptor.on_create(&node("p2", "Bea")).unwrap();
        assert_eq!(store.len(), 2);

        let renamed = node("p1", "Cid");
        interceptor
            .on_set(&renamed, &Path::from(["p1", "name"]), &"Cid".into())
            .unwrap();
        assert_eq!(interceptor.load("p1").unwrap(), Some(renamed));

        interceptor.on_delete(&node("p2", "Bea")).unwrap();
        assert!(!store.contains_key("p2"));
        assert_eq!(interceptor.recover().unwrap().len(), 1);
    }

    #[test]
    fn test_reset_policy() {
        let store = MemoryKeyValueStore::new();
        let mut keep = PersistenceInterceptor::new(store.clone()).retain_on_reset();
        keep.on_create(&node("p1", "Ann")).unwrap();
        keep.on_reset().unwrap();
        assert_eq!(store.len(), 1);

        let mut clear = PersistenceInterceptor::new(store.clone());
        clear.on_reset().unwrap();
        assert!(store.is_empty());
    }
}

//! Manager for the schema's declared indexes
//!
//! Indexes are maintained incrementally from [`IndexEvent`]s raised by the
//! graph's apply step. Every check that could fail runs in `validate_*`
//! before the node table is touched, so event handling itself is infallible.

use super::graph_index::GraphIndex;
use crate::graph::{GraphError, GraphResult, IndexEvent, Node, NodeId, PropertyValue, TypeName};
use crate::schema::{IndexSpec, Schema};
use indexmap::IndexMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct IndexEntry {
    spec: IndexSpec,
    index: GraphIndex,
}

/// Manager for all declared indexes of one graph
#[derive(Debug, Clone, Default)]
pub struct IndexManager {
    indexes: IndexMap<String, IndexEntry>,
}

impl IndexManager {
    pub fn new(schema: &Schema) -> Self {
        let indexes = schema
            .indexes()
            .map(|spec| {
                let index = match spec.group_by {
                    Some(_) => GraphIndex::grouped(),
                    None => GraphIndex::flat(),
                };
                (spec.name.clone(), IndexEntry { spec: spec.clone(), index })
            })
            .collect();
        Self { indexes }
    }

    /// Indexes whose target type is in the chain of `type_name`
    fn matching<'a>(
        &'a self,
        schema: &'a Schema,
        type_name: &'a TypeName,
    ) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.indexes
            .values()
            .filter(move |e| schema.is_instance_of(type_name.as_str(), e.spec.type_name.as_str()))
    }

    /// Check that `node` carries every grouping property its indexes need
    pub fn validate_node(&self, schema: &Schema, node: &Node) -> GraphResult<()> {
        for entry in self.matching(schema, &node.type_name) {
            if let Some(key) = &entry.spec.group_by {
                let present = node.get_property(key).map(|v| !v.is_null()).unwrap_or(false);
                if !present {
                    return Err(GraphError::MissingIndexedProperty {
                        index: entry.spec.name.clone(),
                        property: key.clone(),
                        node: node.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check that setting `key` to `value` keeps the node indexable
    pub fn validate_property(
        &self,
        schema: &Schema,
        node: &Node,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<()> {
        if !value.is_null() {
            return Ok(());
        }
        match self
            .matching(schema, &node.type_name)
            .find(|e| e.spec.group_by.as_deref() == Some(key))
        {
            Some(entry) => Err(GraphError::MissingIndexedProperty {
                index: entry.spec.name.clone(),
                property: key.to_string(),
                node: node.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Apply a change event to every affected index
    pub fn handle_event(&mut self, schema: &Schema, event: IndexEvent<'_>) {
        match event {
            IndexEvent::NodeCreated(node) => {
                for entry in self.indexes.values_mut() {
                    if !schema.is_instance_of(node.type_name.as_str(), entry.spec.type_name.as_str()) {
                        continue;
                    }
                    let group = entry
                        .spec
                        .group_by
                        .as_ref()
                        .and_then(|key| node.get_property(key))
                        .map(PropertyValue::index_key);
                    entry.index.insert(group.as_deref(), node.id.clone());
                    debug!("Indexed node {} in {}", node.id, entry.spec.name);
                }
            }
            IndexEvent::NodeDeleted(node) => {
                for entry in self.indexes.values_mut() {
                    if schema.is_instance_of(node.type_name.as_str(), entry.spec.type_name.as_str()) {
                        entry.index.remove(&node.id);
                    }
                    // Buckets keyed by the deleted id group nodes referencing it.
                    entry.index.purge_group(node.id.as_str());
                }
                debug!("Removed node {} from indexes", node.id);
            }
            IndexEvent::PropertySet { id, type_name, key, old_value, new_value } => {
                if old_value == new_value {
                    return;
                }
                let old_key = old_value.index_key();
                let new_key = new_value.index_key();
                for entry in self.indexes.values_mut() {
                    if entry.spec.group_by.as_deref() != Some(key)
                        || !schema.is_instance_of(type_name.as_str(), entry.spec.type_name.as_str())
                    {
                        continue;
                    }
                    entry.index.remove_from(&old_key, id);
                    entry.index.insert(Some(&new_key), id.clone());
                    debug!("Moved node {} in {} from {:?} to {:?}", id, entry.spec.name, old_key, new_key);
                }
            }
        }
    }

    /// Ids of an ungrouped index, or of one group of a grouped index
    ///
    /// Unknown index names yield an empty slice.
    pub fn find(&self, name: &str, group: Option<&str>) -> &[NodeId] {
        self.indexes
            .get(name)
            .map(|entry| entry.index.ids(group))
            .unwrap_or(&[])
    }

    pub fn get_index(&self, name: &str) -> Option<&GraphIndex> {
        self.indexes.get(name).map(|entry| &entry.index)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    /// Empty every index, keeping the declarations
    pub fn clear(&mut self) {
        for entry in self.indexes.values_mut() {
            entry.index.clear();
        }
    }
}

//! Graph change events consumed by index maintenance

use super::node::Node;
use super::property::PropertyValue;
use super::types::{NodeId, TypeName};

#[derive(Debug, Clone)]
pub enum IndexEvent<'a> {
    NodeCreated(&'a Node),
    NodeDeleted(&'a Node),
    /// A top-level property of `id` changed from `old_value` to `new_value`
    PropertySet {
        id: &'a NodeId,
        type_name: &'a TypeName,
        key: &'a str,
        old_value: &'a PropertyValue,
        new_value: &'a PropertyValue,
    },
}

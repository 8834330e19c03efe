//! Apply-path interceptors
//!
//! A graph applies every operation to its node table first and then hands
//! the outcome to its interceptors, in the order they were registered. The
//! built-in interceptors mirror nodes into a key-value store and record
//! applied operations in a history.

pub mod persistence;
pub mod versioning;

pub use persistence::{KeyValueStore, MemoryKeyValueStore, PersistenceInterceptor};
pub use versioning::{History, MemoryHistory, VersioningInterceptor};

use crate::graph::{GraphResult, Node, Path, PropertyValue};
use crate::operation::GraphOperation;

/// Hooks run after the node table has been changed
///
/// Every hook defaults to a no-op so an interceptor only implements what it
/// observes.
pub trait GraphInterceptor {
    /// Short name used in log output
    fn name(&self) -> &str;

    fn on_create(&mut self, _node: &Node) -> GraphResult<()> {
        Ok(())
    }

    /// `node` is the owning node after the write at `path`
    fn on_set(&mut self, _node: &Node, _path: &Path, _value: &PropertyValue) -> GraphResult<()> {
        Ok(())
    }

    fn on_delete(&mut self, _node: &Node) -> GraphResult<()> {
        Ok(())
    }

    /// Called once per operation after all of its effects were applied
    fn on_applied(&mut self, _operation: &GraphOperation) -> GraphResult<()> {
        Ok(())
    }

    fn on_reset(&mut self) -> GraphResult<()> {
        Ok(())
    }
}

/// Ordered list of interceptors
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn GraphInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Box<dyn GraphInterceptor>) {
        tracing::debug!("Registered interceptor {}", interceptor.name());
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn on_create(&mut self, node: &Node) -> GraphResult<()> {
        self.interceptors.iter_mut().try_for_each(|i| i.on_create(node))
    }

    pub fn on_set(&mut self, node: &Node, path: &Path, value: &PropertyValue) -> GraphResult<()> {
        self.interceptors.iter_mut().try_for_each(|i| i.on_set(node, path, value))
    }

    pub fn on_delete(&mut self, node: &Node) -> GraphResult<()> {
        self.interceptors.iter_mut().try_for_each(|i| i.on_delete(node))
    }

    pub fn on_applied(&mut self, operation: &GraphOperation) -> GraphResult<()> {
        self.interceptors.iter_mut().try_for_each(|i| i.on_applied(operation))
    }

    pub fn on_reset(&mut self) -> GraphResult<()> {
        self.interceptors.iter_mut().try_for_each(|i| i.on_reset())
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

//! Operation history recording

use super::GraphInterceptor;
use crate::graph::{GraphError, GraphResult};
use crate::operation::GraphOperation;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Record of applied operations with a cursor
pub trait History {
    fn record(&mut self, operation: GraphOperation) -> GraphResult<()>;
    /// Drop all records and move the cursor back to the start
    fn reset(&mut self) -> GraphResult<()>;
}

#[derive(Debug, Default)]
struct HistoryState {
    operations: Vec<GraphOperation>,
    cursor: usize,
}

/// In-memory history; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    state: Arc<Mutex<HistoryState>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> Vec<GraphOperation> {
        self.state.lock().map(|s| s.operations.clone()).unwrap_or_default()
    }

    /// Position after the last recorded operation
    pub fn cursor(&self) -> usize {
        self.state.lock().map(|s| s.cursor).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.operations.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inverses of the recorded operations, most recent first
    pub fn undo_operations(&self) -> Vec<GraphOperation> {
        self.operations().iter().rev().map(GraphOperation::invert).collect()
    }
}

impl History for MemoryHistory {
    fn record(&mut self, operation: GraphOperation) -> GraphResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GraphError::Adapter("history lock poisoned".to_string()))?;
        state.operations.push(operation);
        state.cursor += 1;
        Ok(())
    }

    fn reset(&mut self) -> GraphResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GraphError::Adapter("history lock poisoned".to_string()))?;
        state.operations.clear();
        state.cursor = 0;
        Ok(())
    }
}

/// Appends a copy of every successfully applied operation to a [`History`]
#[derive(Debug)]
pub struct VersioningInterceptor<H: History> {
    history: H,
}

impl<H: History> VersioningInterceptor<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &H {
        &self.history
    }
}

impl<H: History> GraphInterceptor for VersioningInterceptor<H> {
    fn name(&self) -> &str {
        "versioning"
    }

    fn on_applied(&mut self, operation: &GraphOperation) -> GraphResult<()> {
        self.history.record(operation.clone())?;
        debug!("Recorded {} at {}", operation.name(), operation.path());
        Ok(())
    }

    fn on_reset(&mut self) -> GraphResult<()> {
        self.history.reset()
    }
}

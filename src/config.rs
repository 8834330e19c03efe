//! Graph configuration
//!
//! ```yaml
//! merge_policy: last_writer_wins
//! record_history: true
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How `Graph::merge` treats ids present in both graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Fail with `DuplicateNode` before anything is created
    #[default]
    RejectOnConflict,
    /// Replace the existing node with the incoming one
    LastWriterWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub merge_policy: MergePolicy,
    /// Record applied operations in the graph's built-in history.
    ///
    /// The history keeps every applied operation, including full node
    /// snapshots for deletes, until the graph is reset.
    pub record_history: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::RejectOnConflict,
            record_history: false,
        }
    }
}

impl GraphConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub fn with_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.merge_policy, MergePolicy::RejectOnConflict);
        assert!(!config.record_history);
        assert_eq!(GraphConfig::from_json_str("{}").unwrap(), config);
        assert!(GraphConfig::from_yaml_str("record_history: true").unwrap().record_history);
    }

    #[test]
    fn test_load_yaml() {
        let config = GraphConfig::from_yaml_str("merge_policy: last_writer_wins\nrecord_history: true\n").unwrap();
        assert_eq!(config.merge_policy, MergePolicy::LastWriterWins);
        assert!(config.record_history);
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(matches!(
            GraphConfig::from_json_str(r#"{"merge_policy": "coin_flip"}"#),
            Err(ConfigError::Json(_))
        ));
    }
}

//! Cluster construction errors.

use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::topology::TopologyError;

/// Any error that aborts cluster construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

//! Per-node endpoint construction.
//!
//! A [`NodeBuilder`] builds one compute node's subgraph and returns the
//! [`NodeHandle`] the fabric attaches to. Topology generators receive the
//! builder as `&mut dyn NodeBuilder` and call it once per leaf position.

pub mod assembler;

use crate::graph::{ComponentGraph, ComponentId, GraphError, LinkEndpoint};
use crate::params::SubsystemParams;

pub use assembler::XbgasNodeAssembler;

/// Position-specific parameters a topology supplies for one node,
/// merged over the CPU parameters (e.g. `torus.coordinate`)
pub type ExtraKeys = SubsystemParams;

/// Fabric-facing attachment point of a built node.
///
/// Produced once per node and consumed by the fabric wiring; it is neither
/// `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
pub struct NodeHandle {
    interface: ComponentId,
    port: String,
    latency: String,
}

impl NodeHandle {
    pub fn new(interface: ComponentId, port: impl Into<String>, latency: impl Into<String>) -> Self {
        Self {
            interface,
            port: port.into(),
            latency: latency.into(),
        }
    }

    /// Link-control interface component
    pub fn interface(&self) -> ComponentId {
        self.interface
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn latency(&self) -> &str {
        &self.latency
    }

    /// Consume the handle as the node side of a fabric link
    pub fn into_endpoint(self) -> LinkEndpoint {
        LinkEndpoint::new(self.interface, self.port, self.latency)
    }
}

/// Endpoint-construction capability injected into topology generators
pub trait NodeBuilder {
    /// Build node `node_id` into `graph` under its own namespace
    ///
    /// # Errors
    /// `DuplicateNodeId` if `node_id` was already built into `graph`.
    fn build(
        &mut self,
        graph: &mut ComponentGraph,
        node_id: u32,
        extra_keys: &ExtraKeys,
    ) -> Result<NodeHandle, GraphError>;
}

impl<F> NodeBuilder for F
where
    F: FnMut(&mut ComponentGraph, u32, &ExtraKeys) -> Result<NodeHandle, GraphError>,
{
    fn build(
        &mut self,
        graph: &mut ComponentGraph,
        node_id: u32,
        extra_keys: &ExtraKeys,
    ) -> Result<NodeHandle, GraphError> {
        self(graph, node_id, extra_keys)
    }
}

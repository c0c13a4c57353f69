//! Every node on one router.

use super::{router, FabricParams, Placement, TopologyError, TopologyGenerator};
use crate::error::BuildError;
use crate::graph::{ComponentGraph, ComponentId};
use crate::node::ExtraKeys;
use crate::params::TopologyFamily;

/// Name of the only router
pub const ROUTER_NAME: &str = "router";

/// A single router with one port per node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleRouter {
    ports: usize,
}

impl SingleRouter {
    pub fn new(node_count: usize) -> Result<Self, TopologyError> {
        if node_count == 0 {
            return Err(TopologyError::UnsupportedShape(
                "a single router needs at least one node".to_string(),
            ));
        }
        Ok(Self { ports: node_count })
    }
}

impl TopologyGenerator for SingleRouter {
    fn family(&self) -> TopologyFamily {
        TopologyFamily::SingleRouter
    }

    fn required_endpoints(&self) -> usize {
        self.ports
    }

    fn build_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
    ) -> Result<Vec<ComponentId>, BuildError> {
        let router = router::add_router(graph, fabric, self.family(), ROUTER_NAME, 0, self.ports)?;
        Ok(vec![router])
    }

    fn placement(&self, node_id: u32) -> Placement {
        Placement {
            router: 0,
            port: node_id as usize,
            extra_keys: ExtraKeys::new(),
        }
    }

    fn attachment_link_name(&self, node_id: u32) -> String {
        format!("link{}", node_id)
    }
}

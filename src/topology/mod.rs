//! Interconnect fabric generation.
//!
//! A [`FabricDescriptor`] names the active topology family and its shape.
//! Each family has a [`TopologyGenerator`] that creates the routers, places
//! every endpoint, asks the injected [`NodeBuilder`] to build it and finally
//! wires the returned handles and the router-to-router links.
//! [`TopologyFabricBuilder`] drives a generator through those phases.

pub mod builder;
pub mod dragonfly;
pub mod fat_tree;
pub mod links;
pub mod router;
pub mod single_router;
pub mod torus;
pub mod types;

use crate::config::{Configuration, ConfigError};
use crate::error::BuildError;
use crate::graph::{ComponentGraph, ComponentId, Namespace};
use crate::node::{ExtraKeys, NodeBuilder, NodeHandle};
use crate::params::{self, SubsystemParams, TopologyFamily};
use log::trace;

pub use builder::{build_cluster, BuildStage, TopologyFabricBuilder};
pub use dragonfly::DragonFlyShape;
pub use fat_tree::FatTreeShape;
pub use single_router::SingleRouter;
pub use torus::TorusShape;
pub use types::{FabricDescriptor, TopologyError};

/// Fabric-wide parameters shared by every router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricParams {
    /// Router parameters from the network section
    pub router: SubsystemParams,
    /// Shape parameters handed to every router's topology subcomponent
    pub topology: SubsystemParams,
    /// Latency of node attachment and router-to-router links
    pub link_latency: String,
}

impl FabricParams {
    /// Derive the fabric parameters of `family` once for the whole build
    pub fn from_config(config: &Configuration, family: TopologyFamily) -> Result<Self, ConfigError> {
        Ok(Self {
            router: params::derive_network_params(config)?,
            topology: params::derive_shape_params(config, family)?,
            link_latency: params::fabric_link_latency(config)?,
        })
    }
}

/// Where an endpoint attaches to the fabric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Index into the routers returned by `build_routers`
    pub router: usize,
    pub port: usize,
    /// Position-specific keys merged into the node's CPU parameters
    pub extra_keys: ExtraKeys,
}

/// A built node waiting to be linked to its router port
#[derive(Debug)]
pub struct Attachment {
    pub node_id: u32,
    pub router: usize,
    pub port: usize,
    pub handle: NodeHandle,
}

/// Geometry and wiring of one topology family
pub trait TopologyGenerator {
    fn family(&self) -> TopologyFamily;

    /// Number of endpoints the shape requires
    fn required_endpoints(&self) -> usize;

    /// Create every router; returned ids are indexed by `Placement::router`
    fn build_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
    ) -> Result<Vec<ComponentId>, BuildError>;

    /// Attachment point and extra keys of endpoint `node_id`
    fn placement(&self, node_id: u32) -> Placement;

    /// Link the routers to one another. Families without inter-router links
    /// keep the default.
    fn wire_routers(
        &self,
        _graph: &mut ComponentGraph,
        _fabric: &FabricParams,
        _routers: &[ComponentId],
    ) -> Result<(), BuildError> {
        Ok(())
    }

    /// Name of the link attaching endpoint `node_id`
    fn attachment_link_name(&self, node_id: u32) -> String {
        format!("nic.{}", node_id)
    }

    /// Build every endpoint through `nodes`, one call per leaf position
    fn build_endpoints(
        &self,
        graph: &mut ComponentGraph,
        nodes: &mut dyn NodeBuilder,
    ) -> Result<Vec<Attachment>, BuildError> {
        let count = u32::try_from(self.required_endpoints()).map_err(|_| {
            TopologyError::UnsupportedShape(format!(
                "{} endpoints exceed the node id range",
                self.required_endpoints()
            ))
        })?;

        let mut attachments = Vec::with_capacity(count as usize);
        for node_id in 0..count {
            let Placement {
                router,
                port,
                extra_keys,
            } = self.placement(node_id);
            let handle = nodes.build(graph, node_id, &extra_keys)?;
            attachments.push(Attachment {
                node_id,
                router,
                port,
                handle,
            });
        }
        Ok(attachments)
    }

    /// Link every attachment to its router port, then the routers themselves
    fn wire(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
        routers: &[ComponentId],
        attachments: Vec<Attachment>,
    ) -> Result<(), BuildError> {
        for attachment in attachments {
            let Some(&router) = routers.get(attachment.router) else {
                return Err(TopologyError::UnsupportedShape(format!(
                    "endpoint {} placed on missing router {}",
                    attachment.node_id, attachment.router
                ))
                .into());
            };
            trace!(
                "Attaching node {} to router {} port {}",
                attachment.node_id,
                attachment.router,
                attachment.port
            );
            router::attach_endpoint(
                graph,
                &Namespace::root(),
                &self.attachment_link_name(attachment.node_id),
                attachment.handle,
                router,
                attachment.port,
            )?;
        }
        self.wire_routers(graph, fabric, routers)
    }
}

//! Cluster construction driver.
//!
//! [`TopologyFabricBuilder`] resolves the fabric, creates its routers, builds
//! every endpoint through the injected [`NodeBuilder`] and wires the result.
//! Construction either completes or fails as a whole: on error the partially
//! built graph is dropped and never returned.

use super::{FabricDescriptor, FabricParams, TopologyError, TopologyGenerator};
use crate::config::Configuration;
use crate::error::BuildError;
use crate::graph::{ComponentGraph, GraphError};
use crate::node::{ExtraKeys, NodeBuilder, NodeHandle, XbgasNodeAssembler};
use log::{debug, info, warn};
use std::fmt;

/// Construction stages, in the only order they can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    Unconfigured,
    FamilySelected,
    NodesBuilt,
    FabricWired,
    Complete,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Unconfigured => "unconfigured",
            BuildStage::FamilySelected => "family selected",
            BuildStage::NodesBuilt => "nodes built",
            BuildStage::FabricWired => "fabric wired",
            BuildStage::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

/// Counts the endpoints the wrapped builder actually produced
struct CountingBuilder<'a> {
    inner: &'a mut dyn NodeBuilder,
    built: usize,
}

impl NodeBuilder for CountingBuilder<'_> {
    fn build(
        &mut self,
        graph: &mut ComponentGraph,
        node_id: u32,
        extra_keys: &ExtraKeys,
    ) -> Result<NodeHandle, GraphError> {
        let handle = self.inner.build(graph, node_id, extra_keys)?;
        self.built += 1;
        Ok(handle)
    }
}

/// Builds the component graph of a whole cluster from one configuration
#[derive(Debug)]
pub struct TopologyFabricBuilder<'a> {
    config: &'a Configuration,
    stage: BuildStage,
}

impl<'a> TopologyFabricBuilder<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            stage: BuildStage::Unconfigured,
        }
    }

    /// Last stage reached
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    fn advance(&mut self, next: BuildStage) {
        debug!("Construction stage: {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Build the cluster with xBGAS nodes.
    ///
    /// `node_count` sizes the single router; generated families take their
    /// endpoint count from the shape.
    pub fn build(&mut self, node_count: usize) -> Result<ComponentGraph, BuildError> {
        let mut assembler = XbgasNodeAssembler::from_config(self.config)?;
        self.build_with(node_count, &mut assembler)
    }

    /// Build the cluster, constructing every endpoint with `nodes`
    ///
    /// # Errors
    /// * `AmbiguousTopology` if several topology sections are present, before
    ///   any node is built
    /// * `UnsupportedShape` for shapes that cannot be generated
    /// * `EndpointCountMismatch` if the generator built the wrong number of nodes
    /// * any `GraphError` raised while adding components or links
    pub fn build_with(
        &mut self,
        node_count: usize,
        nodes: &mut dyn NodeBuilder,
    ) -> Result<ComponentGraph, BuildError> {
        self.stage = BuildStage::Unconfigured;

        let descriptor = FabricDescriptor::resolve(self.config)?;
        let generator = descriptor.generator(node_count)?;
        info!(
            "Selected {} topology with {} endpoints",
            descriptor.family(),
            generator.required_endpoints()
        );
        if descriptor.is_generated() && node_count != generator.required_endpoints() {
            warn!(
                "Ignoring node count {}: the {} shape requires {} endpoints",
                node_count,
                descriptor.family(),
                generator.required_endpoints()
            );
        }

        let fabric = FabricParams::from_config(self.config, descriptor.family())?;
        self.run(&*generator, &fabric, nodes)
    }

    /// Drive `generator` through every stage
    pub fn run(
        &mut self,
        generator: &dyn TopologyGenerator,
        fabric: &FabricParams,
        nodes: &mut dyn NodeBuilder,
    ) -> Result<ComponentGraph, BuildError> {
        self.advance(BuildStage::FamilySelected);
        let mut graph = ComponentGraph::new();

        let routers = generator.build_routers(&mut graph, fabric)?;
        debug!("Created {} routers", routers.len());

        let mut counting = CountingBuilder {
            inner: nodes,
            built: 0,
        };
        let attachments = generator.build_endpoints(&mut graph, &mut counting)?;
        let expected = generator.required_endpoints();
        if counting.built != expected || attachments.len() != expected {
            return Err(TopologyError::EndpointCountMismatch {
                expected,
                actual: counting.built,
            }
            .into());
        }
        self.advance(BuildStage::NodesBuilt);

        generator.wire(&mut graph, fabric, &routers, attachments)?;
        self.advance(BuildStage::FabricWired);

        self.advance(BuildStage::Complete);
        info!("Built {} cluster: {}", generator.family(), graph);
        Ok(graph)
    }
}

/// Build the xBGAS cluster described by `config`
pub fn build_cluster(config: &Configuration, node_count: usize) -> Result<ComponentGraph, BuildError> {
    TopologyFabricBuilder::new(config).build(node_count)
}

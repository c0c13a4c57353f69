//! Router creation and endpoint attachment shared by all families.

use super::FabricParams;
use crate::graph::{ComponentGraph, ComponentId, GraphError, LinkEndpoint, Namespace};
use crate::node::NodeHandle;
use crate::params::TopologyFamily;
use log::debug;

/// Kind of every fabric router
pub const ROUTER_KIND: &str = "merlin.hr_router";

/// Slot of the router's topology subcomponent
pub const TOPOLOGY_SLOT: &str = "topology";

/// Name of router port `port`
pub fn port_name(port: usize) -> String {
    format!("port{}", port)
}

/// Create a router with `num_ports` ports and its topology subcomponent
pub fn add_router(
    graph: &mut ComponentGraph,
    fabric: &FabricParams,
    family: TopologyFamily,
    name: &str,
    id: usize,
    num_ports: usize,
) -> Result<ComponentId, GraphError> {
    debug!("Creating router '{}' (id {}, {} ports)", name, id, num_ports);
    let params = fabric
        .router
        .clone()
        .with("id", id)
        .with("num_ports", num_ports);
    let router = graph.add_component(&Namespace::root(), name, ROUTER_KIND, params)?;
    graph.attach_subcomponent(
        router,
        TOPOLOGY_SLOT,
        family.router_topology_kind(),
        fabric.topology.clone(),
    )?;
    Ok(router)
}

/// Link a node handle to `port` of `router` at the handle's latency.
/// Attachment links are never cut across partitions.
pub fn attach_endpoint(
    graph: &mut ComponentGraph,
    namespace: &Namespace,
    link_name: &str,
    handle: NodeHandle,
    router: ComponentId,
    port: usize,
) -> Result<(), GraphError> {
    let latency = handle.latency().to_string();
    graph.connect_no_cut(
        namespace,
        link_name,
        handle.into_endpoint(),
        LinkEndpoint::new(router, port_name(port), latency),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SubsystemParams;

    fn fabric() -> FabricParams {
        FabricParams {
            router: SubsystemParams::new().with("link_bw", "10GB/s"),
            topology: SubsystemParams::new().with("fattree.shape", "4"),
            link_latency: "20ns".to_string(),
        }
    }

    #[test]
    fn test_add_router() {
        let mut graph = ComponentGraph::new();
        let router = add_router(&mut graph, &fabric(), TopologyFamily::FatTree, "rtr.l0.0", 3, 8).unwrap();

        let component = graph.component(router).unwrap();
        assert_eq!(component.kind(), ROUTER_KIND);
        assert_eq!(component.params().get_int("id"), Some(3));
        assert_eq!(component.params().get_int("num_ports"), Some(8));
        assert_eq!(component.params().get_str("link_bw"), Some("10GB/s"));

        let topology = graph.subcomponent(router, TOPOLOGY_SLOT).unwrap();
        let topology = graph.component(topology).unwrap();
        assert_eq!(topology.kind(), "merlin.fattree");
        assert_eq!(topology.params().get_str("fattree.shape"), Some("4"));
    }

    #[test]
    fn test_attach_endpoint() {
        let mut graph = ComponentGraph::new();
        let router = add_router(&mut graph, &fabric(), TopologyFamily::SingleRouter, "router", 0, 1).unwrap();
        let iface = graph
            .add_component(&Namespace::node(0), "iface", "merlin.linkcontrol", SubsystemParams::new())
            .unwrap();

        let handle = NodeHandle::new(iface, "rtr_port", "5ns");
        attach_endpoint(&mut graph, &Namespace::root(), "link0", handle, router, 0).unwrap();

        let link = &graph.links()[0];
        assert!(link.is_no_cut());
        let (left, right) = link.endpoints();
        assert_eq!(left.port, "rtr_port");
        assert_eq!(right.port, "port0");
        assert_eq!(right.latency, "5ns");
    }
}

//! xBGAS compute node assembly.
//!
//! Each node is a `revcpu.RevCPU` with two memory chains:
//!
//! ```text
//! cpu<id>
//!   memory         revcpu.RevBasicMemCtrl        (local load/store queue)
//!     memIface     memHierarchy.standardInterface --port--> memory<id>.direct_link
//!   remote_memory  revcpu.RevBasicRmtMemCtrl
//!     xbgasNicIface  revcpu.XbgasNIC
//!       iface      merlin.linkcontrol            --rtr_port--> fabric
//! memory<id>       memHierarchy.MemController
//!   backend        memHierarchy.simpleMem
//! ```

use super::{ExtraKeys, NodeBuilder, NodeHandle};
use crate::config::{Configuration, ConfigError};
use crate::graph::{ComponentGraph, GraphError, LinkEndpoint, Namespace};
use crate::params::{self, SubsystemParams};
use log::debug;

pub const CPU_KIND: &str = "revcpu.RevCPU";
pub const LSQ_KIND: &str = "revcpu.RevBasicMemCtrl";
pub const MEM_IFACE_KIND: &str = "memHierarchy.standardInterface";
pub const MEM_CTRL_KIND: &str = "memHierarchy.MemController";
pub const MEMORY_KIND: &str = "memHierarchy.simpleMem";
pub const RMT_MEM_CTRL_KIND: &str = "revcpu.RevBasicRmtMemCtrl";
pub const NIC_KIND: &str = "revcpu.XbgasNIC";
pub const LINK_CONTROL_KIND: &str = "merlin.linkcontrol";

/// Port of the link-control interface facing the fabric
pub const FABRIC_PORT: &str = "rtr_port";

/// Builds xBGAS nodes from parameter sets derived once per configuration
#[derive(Debug, Clone)]
pub struct XbgasNodeAssembler {
    cpu: SubsystemParams,
    lsq: SubsystemParams,
    mem_ctrl: SubsystemParams,
    memory: SubsystemParams,
    link_control: SubsystemParams,
    memory_latency: String,
    fabric_latency: String,
}

impl XbgasNodeAssembler {
    /// Derive every per-node parameter set from `config`
    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self {
            cpu: params::derive_cpu_params(config)?,
            lsq: params::derive_lsq_params(config)?,
            mem_ctrl: params::derive_mem_ctrl_params(config)?,
            memory: params::derive_memory_params(config)?,
            link_control: params::derive_link_control_params(config)?,
            memory_latency: params::local_memory_latency(config)?,
            fabric_latency: params::fabric_link_latency(config)?,
        })
    }
}

impl NodeBuilder for XbgasNodeAssembler {
    fn build(
        &mut self,
        graph: &mut ComponentGraph,
        node_id: u32,
        extra_keys: &ExtraKeys,
    ) -> Result<NodeHandle, GraphError> {
        graph.register_node(node_id)?;
        debug!("Building xBGAS node {}", node_id);
        let ns = Namespace::node(node_id);

        let mut cpu_params = self.cpu.clone();
        cpu_params.merge(extra_keys);
        let cpu = graph.add_component(&ns, &format!("cpu{}", node_id), CPU_KIND, cpu_params)?;

        // Local chain
        let lsq = graph.attach_subcomponent(cpu, "memory", LSQ_KIND, self.lsq.clone())?;
        let mem_iface =
            graph.attach_subcomponent(lsq, "memIface", MEM_IFACE_KIND, SubsystemParams::new())?;
        let mem_ctrl = graph.add_component(
            &ns,
            &format!("memory{}", node_id),
            MEM_CTRL_KIND,
            self.mem_ctrl.clone(),
        )?;
        graph.attach_subcomponent(mem_ctrl, "backend", MEMORY_KIND, self.memory.clone())?;
        graph.connect(
            &ns,
            &format!("link_miface_mem{}", node_id),
            LinkEndpoint::new(mem_iface, "port", self.memory_latency.as_str()),
            LinkEndpoint::new(mem_ctrl, "direct_link", self.memory_latency.as_str()),
        )?;

        // Remote chain
        let rmt = graph.attach_subcomponent(
            cpu,
            "remote_memory",
            RMT_MEM_CTRL_KIND,
            SubsystemParams::new(),
        )?;
        let nic = graph.attach_subcomponent(rmt, "xbgasNicIface", NIC_KIND, SubsystemParams::new())?;
        let iface =
            graph.attach_subcomponent(nic, "iface", LINK_CONTROL_KIND, self.link_control.clone())?;

        Ok(NodeHandle::new(iface, FABRIC_PORT, self.fabric_latency.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STAR_DEFAULTS;
    use crate::config_loader::{parse_config, Overrides};

    fn assembler() -> XbgasNodeAssembler {
        let config = parse_config(STAR_DEFAULTS, &Overrides::none()).unwrap();
        XbgasNodeAssembler::from_config(&config).unwrap()
    }

    #[test]
    fn test_build_node_subgraph() {
        let mut assembler = assembler();
        let mut graph = ComponentGraph::new();
        let handle = assembler.build(&mut graph, 2, &ExtraKeys::new()).unwrap();

        // cpu, lsq, memIface, memctrl, backend, remote, nic, iface
        assert_eq!(graph.component_count(), 8);
        assert_eq!(graph.link_count(), 1);

        let cpu = graph.find("node2.cpu2").unwrap();
        assert_eq!(graph.component(cpu).unwrap().kind(), CPU_KIND);
        assert!(graph.find("node2.cpu2:memory:memIface").is_some());
        assert!(graph.find("node2.memory2:backend").is_some());

        let link = &graph.links()[0];
        assert_eq!(link.name(), "node2.link_miface_mem2");
        let (left, right) = link.endpoints();
        assert_eq!(left.port, "port");
        assert_eq!(right.port, "direct_link");
        assert_eq!(left.latency, "50ps");

        assert_eq!(handle.port(), FABRIC_PORT);
        assert_eq!(handle.latency(), "20ns");
        let iface = graph.component(handle.interface()).unwrap();
        assert_eq!(iface.name(), "node2.cpu2:remote_memory:xbgasNicIface:iface");
        assert_eq!(iface.params().get_str("link_bw"), Some("10GB/s"));
    }

    #[test]
    fn test_extra_keys_reach_cpu() {
        let mut assembler = assembler();
        let mut graph = ComponentGraph::new();
        let extra = ExtraKeys::new().with("torus.coordinate", "1x0");
        assembler.build(&mut graph, 0, &extra).unwrap();

        let cpu = graph.find("node0.cpu0").unwrap();
        let params = graph.component(cpu).unwrap().params();
        assert_eq!(params.get_str("torus.coordinate"), Some("1x0"));
        assert_eq!(params.get_str("clock"), Some("2.5GHz"));
    }

    #[test]
    fn test_duplicate_node_id() {
        let mut assembler = assembler();
        let mut graph = ComponentGraph::new();
        assembler.build(&mut graph, 1, &ExtraKeys::new()).unwrap();
        let count = graph.component_count();

        let err = assembler.build(&mut graph, 1, &ExtraKeys::new()).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNodeId(1));
        assert_eq!(graph.component_count(), count);
    }
}

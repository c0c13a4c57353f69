//! End-to-end construction of single-router clusters.

use rev_cluster::config::{ConfigError, Configuration};
use rev_cluster::config_loader::{load_config, parse_config, Overrides, REV_EXE_ENV};
use rev_cluster::error::BuildError;
use rev_cluster::graph::{ComponentGraph, GraphError};
use rev_cluster::node::{ExtraKeys, NodeBuilder, NodeHandle, XbgasNodeAssembler};
use rev_cluster::params::TopologyFamily;
use rev_cluster::topology::{
    build_cluster, Attachment, BuildStage, FabricParams, Placement, SingleRouter,
    TopologyError, TopologyFabricBuilder, TopologyGenerator,
};
use std::io::Write;
use tempfile::NamedTempFile;

const CLUSTER_CONFIG: &str = r#"
# Four-node test cluster
[CPU]
clock = 1.0GHz
program = foo.exe
memSize = 1073741824
startAddr = [0:0x00000000]
machine = [0:RV64GCX]
memCost = [0:1:10]
enable_xbgas = 1
enable_memH = 1
cpu_memctrl_latency = 50ps

[LSQ]
max_loads = 64
max_stores = 16
max_flush = 16
max_llsc = 16
max_readlock = 16
max_writeunlock = 16
max_custom = 16
ops_per_cycle = 16

[MemoryCtrl]
addr_range_start = 0
addr_range_end = 1073741823
backing = malloc

[Memory]
access_time = 100ns
mem_size = 8GB

[Network]
latency = 20ns
bandwidth = 10GB/s
flit_size = 32B
input_latency = 50ps
output_latency = 50ps
input_buf_size = 512B
output_buf_size = 512B
"#;

fn cluster_config() -> Configuration {
    parse_config(CLUSTER_CONFIG, &Overrides::none()).unwrap()
}

fn cpu_programs(graph: &ComponentGraph) -> Vec<String> {
    graph
        .components_of_kind("revcpu.RevCPU")
        .map(|(_, cpu)| cpu.params().get_str("program").unwrap().to_string())
        .collect()
}

#[test]
fn test_four_node_single_router() {
    let graph = build_cluster(&cluster_config(), 4).unwrap();

    let routers: Vec<_> = graph.components_of_kind("merlin.hr_router").collect();
    assert_eq!(routers.len(), 1);
    let (router_id, router) = routers[0];
    assert_eq!(router.name(), "router");
    assert_eq!(router.params().get_int("num_ports"), Some(4));
    assert_eq!(router.params().get_str("xbar_arb"), Some("merlin.xbar_arb_lru"));

    assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    for node in 0..4 {
        let cpu = graph.find(&format!("node{}.cpu{}", node, node)).unwrap();
        let component = graph.component(cpu).unwrap();
        assert_eq!(component.params().get_str("clock"), Some("1.0GHz"));
        assert_eq!(component.params().get_int("memSize"), Some(1_073_741_824));

        let lsq = graph.subcomponent(cpu, "memory").unwrap();
        assert_eq!(graph.component(lsq).unwrap().params().get_int("max_loads"), Some(64));
        assert!(graph.subcomponent(lsq, "memIface").is_some());
        assert!(graph.subcomponent(cpu, "remote_memory").is_some());
        assert!(graph.find(&format!("node{}.memory{}:backend", node, node)).is_some());
    }

    let router_links: Vec<_> = graph.links_of(router_id).collect();
    assert_eq!(router_links.len(), 4);
    let mut ports: Vec<_> = router_links
        .iter()
        .map(|link| link.endpoint_on(router_id).unwrap().port.clone())
        .collect();
    ports.sort();
    assert_eq!(ports, vec!["port0", "port1", "port2", "port3"]);
    assert!(router_links.iter().all(|link| link.is_no_cut()));

    // 4 router links plus one local memory link per node
    assert_eq!(graph.link_count(), 8);
}

#[test]
fn test_rev_exe_overrides_every_cpu() {
    let overrides = Overrides {
        program: Some("bar.exe".to_string()),
    };
    let config = parse_config(CLUSTER_CONFIG, &overrides).unwrap();
    let graph = build_cluster(&config, 3).unwrap();
    assert_eq!(cpu_programs(&graph), vec!["bar.exe"; 3]);
}

#[test]
fn test_rev_exe_from_environment() {
    std::env::set_var(REV_EXE_ENV, "bar.exe");
    let overrides = Overrides::from_env();
    std::env::remove_var(REV_EXE_ENV);

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", CLUSTER_CONFIG).unwrap();
    let config = load_config(file.path(), &overrides).unwrap();
    let graph = build_cluster(&config, 2).unwrap();
    assert_eq!(cpu_programs(&graph), vec!["bar.exe"; 2]);
}

#[test]
fn test_missing_clock_fails_to_load() {
    let content = CLUSTER_CONFIG.replace("clock = 1.0GHz\n", "");
    let err = parse_config(&content, &Overrides::none()).unwrap_err();
    assert_eq!(err, ConfigError::MissingKey("CPU".to_string(), "clock".to_string()));
}

#[test]
fn test_ambiguous_topology_builds_no_nodes() {
    let content = format!(
        "{}\n[FatTree]\nshape = 4\n\n[Torus]\nnum_dims = 1\nshape = 4\nwidth = 1\nlocal_ports = 1\n",
        CLUSTER_CONFIG
    );
    let config = parse_config(&content, &Overrides::none()).unwrap();

    let mut calls = 0;
    let mut counting = |_: &mut ComponentGraph,
                        _: u32,
                        _: &ExtraKeys|
                        -> Result<NodeHandle, GraphError> {
        calls += 1;
        Err(GraphError::DanglingLinkEndpoint("unused".to_string()))
    };
    let mut builder = TopologyFabricBuilder::new(&config);
    let err = builder.build_with(4, &mut counting).unwrap_err();

    assert!(matches!(
        err,
        BuildError::Topology(TopologyError::AmbiguousTopology(ref sections)) if sections.len() == 2
    ));
    assert_eq!(builder.stage(), BuildStage::Unconfigured);
    drop(counting);
    assert_eq!(calls, 0);
}

/// Builds one endpoint fewer than its shape requires
struct ShortGenerator(SingleRouter);

impl TopologyGenerator for ShortGenerator {
    fn family(&self) -> TopologyFamily {
        self.0.family()
    }

    fn required_endpoints(&self) -> usize {
        self.0.required_endpoints()
    }

    fn build_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
    ) -> Result<Vec<rev_cluster::graph::ComponentId>, BuildError> {
        self.0.build_routers(graph, fabric)
    }

    fn placement(&self, node_id: u32) -> Placement {
        self.0.placement(node_id)
    }

    fn build_endpoints(
        &self,
        graph: &mut ComponentGraph,
        nodes: &mut dyn NodeBuilder,
    ) -> Result<Vec<Attachment>, BuildError> {
        let count = self.required_endpoints() as u32 - 1;
        let mut attachments = Vec::new();
        for node_id in 0..count {
            let placement = self.placement(node_id);
            let handle = nodes.build(graph, node_id, &placement.extra_keys)?;
            attachments.push(Attachment {
                node_id,
                router: placement.router,
                port: placement.port,
                handle,
            });
        }
        Ok(attachments)
    }
}

#[test]
fn test_endpoint_count_mismatch() {
    let config = cluster_config();
    let fabric = FabricParams::from_config(&config, TopologyFamily::SingleRouter).unwrap();
    let mut assembler = XbgasNodeAssembler::from_config(&config).unwrap();
    let generator = ShortGenerator(SingleRouter::new(4).unwrap());

    let mut builder = TopologyFabricBuilder::new(&config);
    let err = builder.run(&generator, &fabric, &mut assembler).unwrap_err();
    assert_eq!(
        err,
        BuildError::Topology(TopologyError::EndpointCountMismatch {
            expected: 4,
            actual: 3
        })
    );
    assert_eq!(builder.stage(), BuildStage::FamilySelected);
}

#[test]
fn test_rebuild_is_deterministic() {
    let config = cluster_config();
    let first = build_cluster(&config, 3).unwrap();
    let second = build_cluster(&config, 3).unwrap();

    let names = |graph: &ComponentGraph| -> Vec<String> {
        graph.components().map(|(_, c)| c.name().to_string()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(first.to_string(), second.to_string());
}

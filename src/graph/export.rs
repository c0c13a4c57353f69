//! Serializable view of a finished component graph.

use super::{ComponentGraph, LinkEndpoint};
use crate::params::SubsystemParams;
use serde::Serialize;
use std::path::Path;

/// Document written by `--output`
#[derive(Debug, Serialize)]
pub struct GraphDocument {
    pub nodes: Vec<u32>,
    pub components: Vec<ComponentEntry>,
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Serialize)]
pub struct ComponentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(skip_serializing_if = "SubsystemParams::is_empty")]
    pub params: SubsystemParams,
}

#[derive(Debug, Serialize)]
pub struct EndpointEntry {
    pub component: String,
    pub port: String,
    pub latency: String,
}

#[derive(Debug, Serialize)]
pub struct LinkEntry {
    pub name: String,
    pub left: EndpointEntry,
    pub right: EndpointEntry,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_cut: bool,
}

impl GraphDocument {
    pub fn from_graph(graph: &ComponentGraph) -> Self {
        let name_of = |id| {
            graph
                .component(id)
                .map(|component| component.name().to_string())
                .unwrap_or_default()
        };
        let endpoint = |end: &LinkEndpoint| EndpointEntry {
            component: name_of(end.component),
            port: end.port.clone(),
            latency: end.latency.clone(),
        };

        let components = graph
            .components()
            .map(|(_, component)| ComponentEntry {
                name: component.name().to_string(),
                kind: component.kind().to_string(),
                parent: component.owner().map(|owner| name_of(owner.parent)),
                slot: component.owner().map(|owner| owner.slot.clone()),
                params: component.params().clone(),
            })
            .collect();

        let links = graph
            .links()
            .iter()
            .map(|link| {
                let (left, right) = link.endpoints();
                LinkEntry {
                    name: link.name().to_string(),
                    left: endpoint(left),
                    right: endpoint(right),
                    no_cut: link.is_no_cut(),
                }
            })
            .collect();

        Self {
            nodes: graph.node_ids().collect(),
            components,
            links,
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Write `graph` to `output_path`: JSON for a `.json` extension, YAML otherwise
pub fn write_graph(graph: &ComponentGraph, output_path: &Path) -> color_eyre::eyre::Result<()> {
    let document = GraphDocument::from_graph(graph);
    let is_json = output_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let content = if is_json {
        document.to_json()?
    } else {
        document.to_yaml()?
    };
    std::fs::write(output_path, content)?;
    log::info!("Wrote component graph to {:?}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Namespace;
    use tempfile::Builder;

    fn sample_graph() -> ComponentGraph {
        let mut graph = ComponentGraph::new();
        graph.register_node(0).unwrap();
        let cpu = graph
            .add_component(
                &Namespace::node(0),
                "cpu0",
                "revcpu.RevCPU",
                SubsystemParams::new().with("memSize", 1024i64),
            )
            .unwrap();
        let iface = graph
            .attach_subcomponent(cpu, "iface", "merlin.linkcontrol", SubsystemParams::new())
            .unwrap();
        let router = graph
            .add_component(&Namespace::root(), "router", "merlin.hr_router", SubsystemParams::new())
            .unwrap();
        graph
            .connect_no_cut(
                &Namespace::root(),
                "link0",
                LinkEndpoint::new(iface, "rtr_port", "20ns"),
                LinkEndpoint::new(router, "port0", "20ns"),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_document_contents() {
        let document = GraphDocument::from_graph(&sample_graph());
        assert_eq!(document.nodes, vec![0]);
        assert_eq!(document.components.len(), 3);
        assert_eq!(document.components[1].parent.as_deref(), Some("node0.cpu0"));
        assert_eq!(document.links[0].left.component, "node0.cpu0:iface");
        assert!(document.links[0].no_cut);
    }

    #[test]
    fn test_json_output() {
        let json = GraphDocument::from_graph(&sample_graph()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["components"][0]["type"], "revcpu.RevCPU");
        assert_eq!(value["components"][0]["params"]["memSize"], 1024);
        assert!(value["components"][2].get("params").is_none());
    }

    #[test]
    fn test_write_graph_picks_format() {
        let graph = sample_graph();

        let json_file = Builder::new().suffix(".json").tempfile().unwrap();
        write_graph(&graph, json_file.path()).unwrap();
        let content = std::fs::read_to_string(json_file.path()).unwrap();
        assert!(content.trim_start().starts_with('{'));

        let yaml_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write_graph(&graph, yaml_file.path()).unwrap();
        let content = std::fs::read_to_string(yaml_file.path()).unwrap();
        assert!(content.contains("name: node0.cpu0"));
    }
}

//! Append-only component graph.
//!
//! The graph is the single mutation point of cluster construction. Components,
//! subcomponent ownership edges and links are only ever added; nothing is
//! removed or changed after insertion. Once construction completes the graph
//! is handed to a [`SimulationHost`] or exported as a [`GraphDocument`].

pub mod export;
pub mod host;
pub mod types;

use crate::params::SubsystemParams;
use log::trace;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

pub use export::{write_graph, GraphDocument};
pub use host::SimulationHost;
pub use types::{Component, ComponentId, Link, LinkEndpoint, Namespace, Owner};

/// Graph construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Duplicate component name '{0}'")]
    DuplicateComponentName(String),
    #[error("Node {0} was already built")]
    DuplicateNodeId(u32),
    #[error("Link '{0}' has a dangling endpoint")]
    DanglingLinkEndpoint(String),
    #[error("Port '{port}' of component '{component}' is already linked")]
    PortAlreadyLinked { component: String, port: String },
    #[error("Unknown component {0}")]
    UnknownComponent(ComponentId),
}

/// Named components, ownership edges and links of one cluster
#[derive(Debug, Default)]
pub struct ComponentGraph {
    components: Vec<Component>,
    links: Vec<Link>,
    by_name: HashMap<String, ComponentId>,
    link_names: HashSet<String>,
    used_ports: HashSet<(ComponentId, String)>,
    nodes: BTreeSet<u32>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        name: String,
        kind: &str,
        params: SubsystemParams,
        owner: Option<Owner>,
    ) -> Result<ComponentId, GraphError> {
        if self.by_name.contains_key(&name) {
            return Err(GraphError::DuplicateComponentName(name));
        }
        let id = ComponentId(self.components.len());
        trace!("Adding component {} '{}' ({})", id, name, kind);
        self.by_name.insert(name.clone(), id);
        self.components.push(Component {
            name,
            kind: kind.to_string(),
            params,
            owner,
            subcomponents: Vec::new(),
        });
        Ok(id)
    }

    /// Add a top-level component named `local` inside `namespace`
    ///
    /// # Errors
    /// `DuplicateComponentName` if the qualified name is taken.
    pub fn add_component(
        &mut self,
        namespace: &Namespace,
        local: &str,
        kind: &str,
        params: SubsystemParams,
    ) -> Result<ComponentId, GraphError> {
        self.insert(namespace.qualify(local), kind, params, None)
    }

    /// Attach a subcomponent to `parent` in `slot`. The subcomponent is named
    /// `parent:slot` and owned by the parent for its whole lifetime.
    pub fn attach_subcomponent(
        &mut self,
        parent: ComponentId,
        slot: &str,
        kind: &str,
        params: SubsystemParams,
    ) -> Result<ComponentId, GraphError> {
        let parent_name = match self.components.get(parent.0) {
            Some(component) => component.name.clone(),
            None => return Err(GraphError::UnknownComponent(parent)),
        };
        let id = self.insert(
            format!("{}:{}", parent_name, slot),
            kind,
            params,
            Some(Owner {
                parent,
                slot: slot.to_string(),
            }),
        )?;
        self.components[parent.0].subcomponents.push(id);
        Ok(id)
    }

    fn add_link(
        &mut self,
        namespace: &Namespace,
        local: &str,
        left: LinkEndpoint,
        right: LinkEndpoint,
        no_cut: bool,
    ) -> Result<(), GraphError> {
        let name = namespace.qualify(local);
        if self.link_names.contains(&name) {
            return Err(GraphError::DuplicateComponentName(name));
        }
        for endpoint in [&left, &right] {
            let Some(component) = self.components.get(endpoint.component.0) else {
                return Err(GraphError::DanglingLinkEndpoint(name));
            };
            if self
                .used_ports
                .contains(&(endpoint.component, endpoint.port.clone()))
            {
                return Err(GraphError::PortAlreadyLinked {
                    component: component.name.clone(),
                    port: endpoint.port.clone(),
                });
            }
        }
        if left.component == right.component && left.port == right.port {
            return Err(GraphError::PortAlreadyLinked {
                component: self.components[left.component.0].name.clone(),
                port: left.port,
            });
        }

        trace!("Adding link '{}'", name);
        self.used_ports.insert((left.component, left.port.clone()));
        self.used_ports.insert((right.component, right.port.clone()));
        self.link_names.insert(name.clone());
        self.links.push(Link {
            name,
            left,
            right,
            no_cut,
        });
        Ok(())
    }

    /// Link two component ports
    ///
    /// # Errors
    /// * `DanglingLinkEndpoint` if either component is unknown
    /// * `PortAlreadyLinked` if either port already carries a link
    /// * `DuplicateComponentName` if the link name is taken
    pub fn connect(
        &mut self,
        namespace: &Namespace,
        local: &str,
        left: LinkEndpoint,
        right: LinkEndpoint,
    ) -> Result<(), GraphError> {
        self.add_link(namespace, local, left, right, false)
    }

    /// Link two component ports and mark the link as non-partitionable
    pub fn connect_no_cut(
        &mut self,
        namespace: &Namespace,
        local: &str,
        left: LinkEndpoint,
        right: LinkEndpoint,
    ) -> Result<(), GraphError> {
        self.add_link(namespace, local, left, right, true)
    }

    /// Claim a node id. Each id can be claimed once.
    pub fn register_node(&mut self, node_id: u32) -> Result<(), GraphError> {
        if !self.nodes.insert(node_id) {
            return Err(GraphError::DuplicateNodeId(node_id));
        }
        Ok(())
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// Look up a component by its fully qualified name
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Components in insertion order
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(index, component)| (ComponentId(index), component))
    }

    /// Links in insertion order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn components_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (ComponentId, &'a Component)> + 'a {
        self.components()
            .filter(move |(_, component)| component.kind == kind)
    }

    /// Links with an endpoint on `component`
    pub fn links_of(&self, component: ComponentId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.touches(component))
    }

    /// Subcomponent of `parent` in `slot`
    pub fn subcomponent(&self, parent: ComponentId, slot: &str) -> Option<ComponentId> {
        let component = self.component(parent)?;
        component.subcomponents.iter().copied().find(|child| {
            self.components[child.0]
                .owner
                .as_ref()
                .is_some_and(|owner| owner.slot == slot)
        })
    }

    /// Registered node ids in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl fmt::Display for ComponentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top_level = self
            .components
            .iter()
            .filter(|component| !component.is_subcomponent())
            .count();
        write!(
            f,
            "{} nodes, {} components ({} subcomponents), {} links",
            self.nodes.len(),
            top_level,
            self.components.len() - top_level,
            self.links.len()
        )
    }
}

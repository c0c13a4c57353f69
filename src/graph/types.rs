//! Component graph type definitions.

use crate::params::SubsystemParams;
use std::fmt;

/// Index of a component inside its `ComponentGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name scope for components and links.
///
/// Passed explicitly to every construction call; the full name of an entry
/// is `namespace.local`, or just `local` in the root namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Namespace(String);

impl Namespace {
    /// The unprefixed, top-level namespace
    pub fn root() -> Self {
        Self::default()
    }

    /// Namespace of one compute node: `node<id>`
    pub fn node(node_id: u32) -> Self {
        Namespace(format!("node{}", node_id))
    }

    /// Nested namespace below this one
    pub fn child(&self, segment: &str) -> Self {
        Namespace(self.qualify(segment))
    }

    /// Full name of `local` inside this namespace
    pub fn qualify(&self, local: &str) -> String {
        if self.0.is_empty() {
            local.to_string()
        } else {
            format!("{}.{}", self.0, local)
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parent of a subcomponent and the slot it occupies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub parent: ComponentId,
    pub slot: String,
}

/// A named simulation component or subcomponent
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) params: SubsystemParams,
    pub(crate) owner: Option<Owner>,
    pub(crate) subcomponents: Vec<ComponentId>,
}

impl Component {
    /// Globally unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element kind instantiated by the simulation host, e.g. `revcpu.RevCPU`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn params(&self) -> &SubsystemParams {
        &self.params
    }

    /// `None` for top-level components
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn is_subcomponent(&self) -> bool {
        self.owner.is_some()
    }

    /// Subcomponents in attachment order
    pub fn subcomponents(&self) -> &[ComponentId] {
        &self.subcomponents
    }
}

/// One side of a link: component, port and latency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEndpoint {
    pub component: ComponentId,
    pub port: String,
    pub latency: String,
}

impl LinkEndpoint {
    pub fn new(component: ComponentId, port: impl Into<String>, latency: impl Into<String>) -> Self {
        Self {
            component,
            port: port.into(),
            latency: latency.into(),
        }
    }
}

/// An unordered pair of endpoints
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) name: String,
    pub(crate) left: LinkEndpoint,
    pub(crate) right: LinkEndpoint,
    pub(crate) no_cut: bool,
}

impl Link {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> (&LinkEndpoint, &LinkEndpoint) {
        (&self.left, &self.right)
    }

    /// True if the host must never place the two ends on different partitions
    pub fn is_no_cut(&self) -> bool {
        self.no_cut
    }

    /// True if either end belongs to `component`
    pub fn touches(&self, component: ComponentId) -> bool {
        self.left.component == component || self.right.component == component
    }

    /// The endpoint on `component`'s side, if the link touches it
    pub fn endpoint_on(&self, component: ComponentId) -> Option<&LinkEndpoint> {
        if self.left.component == component {
            Some(&self.left)
        } else if self.right.component == component {
            Some(&self.right)
        } else {
            None
        }
    }
}

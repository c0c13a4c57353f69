//! Router-to-router links completed by name from both sides.

use crate::graph::{ComponentGraph, GraphError, LinkEndpoint, Namespace};
use std::collections::BTreeMap;

/// Links announced by one router and waiting for the other side
#[derive(Debug, Default)]
pub struct PendingLinks {
    open: BTreeMap<String, LinkEndpoint>,
}

impl PendingLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one side of the link `name`. The second offer for a name
    /// connects both sides into `graph`.
    pub fn offer(
        &mut self,
        graph: &mut ComponentGraph,
        name: String,
        endpoint: LinkEndpoint,
    ) -> Result<(), GraphError> {
        match self.open.remove(&name) {
            Some(first) => graph.connect(&Namespace::root(), &name, first, endpoint),
            None => {
                self.open.insert(name, endpoint);
                Ok(())
            }
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Fail with the first link that only one side announced
    pub fn finish(self) -> Result<(), GraphError> {
        match self.open.into_keys().next() {
            Some(name) => Err(GraphError::DanglingLinkEndpoint(name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SubsystemParams;

    #[test]
    fn test_second_offer_connects() {
        let mut graph = ComponentGraph::new();
        let a = graph
            .add_component(&Namespace::root(), "a", "merlin.hr_router", SubsystemParams::new())
            .unwrap();
        let b = graph
            .add_component(&Namespace::root(), "b", "merlin.hr_router", SubsystemParams::new())
            .unwrap();

        let mut pending = PendingLinks::new();
        pending
            .offer(&mut graph, "link.a:b".to_string(), LinkEndpoint::new(a, "port0", "20ns"))
            .unwrap();
        assert_eq!(pending.open_count(), 1);
        assert_eq!(graph.link_count(), 0);

        pending
            .offer(&mut graph, "link.a:b".to_string(), LinkEndpoint::new(b, "port1", "20ns"))
            .unwrap();
        assert_eq!(pending.open_count(), 0);
        assert_eq!(graph.link_count(), 1);
        assert!(pending.finish().is_ok());
    }

    #[test]
    fn test_unmatched_offer_dangles() {
        let mut graph = ComponentGraph::new();
        let a = graph
            .add_component(&Namespace::root(), "a", "merlin.hr_router", SubsystemParams::new())
            .unwrap();

        let mut pending = PendingLinks::new();
        pending
            .offer(&mut graph, "link.a:z".to_string(), LinkEndpoint::new(a, "port0", "20ns"))
            .unwrap();
        assert_eq!(
            pending.finish(),
            Err(GraphError::DanglingLinkEndpoint("link.a:z".to_string()))
        );
    }
}

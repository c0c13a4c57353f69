//! Dragonfly: all-to-all router groups joined by global links.
//!
//! Router ports are laid out as `hosts_per_router` host ports, then
//! `routers_per_group - 1` intra-group ports, then the global ports. Global
//! links are assigned per group with the absolute scheme: global slot `s`
//! connects to the `(s mod (g-1))`-th other group as parallel link
//! `s div (g-1)`. Slots beyond `intergroup_links * (g-1)` stay unconnected.

use super::links::PendingLinks;
use super::types::shape_count;
use super::{router, FabricParams, Placement, TopologyError, TopologyGenerator};
use crate::error::BuildError;
use crate::graph::{ComponentGraph, ComponentId, LinkEndpoint};
use crate::node::ExtraKeys;
use crate::params::{SubsystemParams, TopologyFamily};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragonFlyShape {
    groups: usize,
    hosts_per_router: usize,
    routers_per_group: usize,
    intergroup_links: usize,
}

impl DragonFlyShape {
    pub fn new(
        groups: usize,
        hosts_per_router: usize,
        routers_per_group: usize,
        intergroup_links: usize,
    ) -> Result<Self, TopologyError> {
        if groups == 0 || hosts_per_router == 0 || routers_per_group == 0 {
            return Err(TopologyError::UnsupportedShape(
                "dragonfly group count, hosts per router and routers per group must be positive"
                    .to_string(),
            ));
        }
        if groups > 1 && intergroup_links == 0 {
            return Err(TopologyError::UnsupportedShape(
                "dragonfly groups need at least one intergroup link".to_string(),
            ));
        }
        let shape = Self {
            groups,
            hosts_per_router,
            routers_per_group,
            intergroup_links,
        };
        groups
            .checked_mul(routers_per_group)
            .and_then(|routers| routers.checked_mul(hosts_per_router))
            .and_then(|_| intergroup_links.checked_mul(groups - 1))
            .ok_or_else(|| TopologyError::UnsupportedShape("dragonfly is too large".to_string()))?;
        Ok(shape)
    }

    pub fn from_params(params: &SubsystemParams) -> Result<Self, TopologyError> {
        Self::new(
            shape_count(params, "dragonfly.num_groups")?,
            shape_count(params, "dragonfly.hosts_per_router")?,
            shape_count(params, "dragonfly.routers_per_group")?,
            shape_count(params, "dragonfly.intergroup_links")?,
        )
    }

    pub fn router_count(&self) -> usize {
        self.groups * self.routers_per_group
    }

    /// Global ports every router carries
    pub fn global_ports_per_router(&self) -> usize {
        if self.groups < 2 {
            return 0;
        }
        let slots = self.intergroup_links * (self.groups - 1);
        slots.div_ceil(self.routers_per_group)
    }

    pub fn ports_per_router(&self) -> usize {
        self.hosts_per_router + self.routers_per_group - 1 + self.global_ports_per_router()
    }

    fn intra_group_port(&self, router: usize, peer: usize) -> usize {
        let offset = if peer < router { peer } else { peer - 1 };
        self.hosts_per_router + offset
    }

    fn first_global_port(&self) -> usize {
        self.hosts_per_router + self.routers_per_group - 1
    }

    /// Destination group and parallel link number of global slot `slot`
    /// of `group`, if the slot is used
    fn global_destination(&self, group: usize, slot: usize) -> Option<(usize, usize)> {
        let others = self.groups - 1;
        if others == 0 || slot >= self.intergroup_links * others {
            return None;
        }
        let relative = slot % others;
        let dest = if relative >= group { relative + 1 } else { relative };
        Some((dest, slot / others))
    }
}

impl TopologyGenerator for DragonFlyShape {
    fn family(&self) -> TopologyFamily {
        TopologyFamily::DragonFly
    }

    fn required_endpoints(&self) -> usize {
        self.router_count() * self.hosts_per_router
    }

    fn build_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
    ) -> Result<Vec<ComponentId>, BuildError> {
        let ports = self.ports_per_router();
        let mut routers = Vec::with_capacity(self.router_count());
        for group in 0..self.groups {
            for r in 0..self.routers_per_group {
                let id = group * self.routers_per_group + r;
                let name = format!("rtr.g{}.r{}", group, r);
                routers.push(router::add_router(graph, fabric, self.family(), &name, id, ports)?);
            }
        }
        Ok(routers)
    }

    fn placement(&self, node_id: u32) -> Placement {
        let node = node_id as usize;
        let router = node / self.hosts_per_router;
        Placement {
            router,
            port: node % self.hosts_per_router,
            extra_keys: ExtraKeys::new()
                .with("dragonfly.group", router / self.routers_per_group)
                .with("dragonfly.router", router % self.routers_per_group),
        }
    }

    fn wire_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
        routers: &[ComponentId],
    ) -> Result<(), BuildError> {
        let latency = fabric.link_latency.as_str();
        let global_ports = self.global_ports_per_router();
        let mut pending = PendingLinks::new();

        for group in 0..self.groups {
            for r in 0..self.routers_per_group {
                let router = routers[group * self.routers_per_group + r];

                for peer in (0..self.routers_per_group).filter(|&peer| peer != r) {
                    pending.offer(
                        graph,
                        format!("link.g{}.r{}r{}", group, r.min(peer), r.max(peer)),
                        LinkEndpoint::new(
                            router,
                            router::port_name(self.intra_group_port(r, peer)),
                            latency,
                        ),
                    )?;
                }

                for port in 0..global_ports {
                    let slot = r * global_ports + port;
                    let Some((dest, num)) = self.global_destination(group, slot) else {
                        continue;
                    };
                    pending.offer(
                        graph,
                        format!("link.global.g{}g{}:{}", group.min(dest), group.max(dest), num),
                        LinkEndpoint::new(
                            router,
                            router::port_name(self.first_global_port() + port),
                            latency,
                        ),
                    )?;
                }
            }
        }
        Ok(pending.finish()?)
    }
}

//! Multi-level fat tree (folded Clos).
//!
//! The shape `d0,u0:d1,u1:...:dn` lists, per level from the leaves up, the
//! down-port count and (for every level but the top) the up-port count of
//! each router. A level-`l` subtree holds `dl` level-`(l-1)` subtrees and
//! `u0*...*u(l-1)` routers; the tree serves `d0*d1*...*dn` hosts.
//!
//! Router ports are numbered down ports first, then up ports.

use super::types::{checked_product, parse_fat_tree_level, shape_text};
use super::{router, FabricParams, Placement, TopologyError, TopologyGenerator};
use crate::error::BuildError;
use crate::graph::{ComponentGraph, ComponentId, LinkEndpoint, Namespace};
use crate::node::ExtraKeys;
use crate::params::{SubsystemParams, TopologyFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatTreeLevel {
    pub down: usize,
    /// Zero at the top level
    pub up: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatTreeShape {
    levels: Vec<FatTreeLevel>,
    hosts: usize,
    /// Routers per level
    routers: Vec<usize>,
    /// Routers per subtree at each level
    per_subtree: Vec<usize>,
    /// Global index of the first router of each level
    first_router: Vec<usize>,
}

impl FatTreeShape {
    /// Parse a `d0,u0:d1,u1:...:dn` shape string
    pub fn parse(shape: &str) -> Result<Self, TopologyError> {
        let parts: Vec<&str> = shape.trim().split(':').collect();
        let mut levels = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let is_top = index + 1 == parts.len();
            let (down, up) = parse_fat_tree_level(part)?;
            if down == 0 {
                return Err(TopologyError::UnsupportedShape(format!(
                    "fat tree level {} has no down ports",
                    index
                )));
            }
            let up = match (up, is_top) {
                (None, true) => 0,
                (Some(up), false) if up > 0 => up,
                (Some(_), true) => {
                    return Err(TopologyError::UnsupportedShape(
                        "the top fat tree level has no up ports".to_string(),
                    ))
                }
                _ => {
                    return Err(TopologyError::UnsupportedShape(format!(
                        "fat tree level {} needs a positive up-port count",
                        index
                    )))
                }
            };
            levels.push(FatTreeLevel { down, up });
        }

        let downs: Vec<usize> = levels.iter().map(|level| level.down).collect();
        let hosts = checked_product(&downs, "fat tree host count")?;

        let ups: Vec<usize> = levels.iter().map(|level| level.up).collect();
        let mut routers = Vec::with_capacity(levels.len());
        let mut per_subtree = Vec::with_capacity(levels.len());
        let mut first_router = Vec::with_capacity(levels.len());
        let mut total = 0usize;
        for level in 0..levels.len() {
            // hosts / (d0*...*dl) subtrees, each with u0*...*u(l-1) routers
            let subtrees = hosts / checked_product(&downs[..=level], "fat tree subtree size")?;
            let size = checked_product(&ups[..level], "fat tree router count")?;
            let count = subtrees
                .checked_mul(size)
                .ok_or_else(|| TopologyError::UnsupportedShape("fat tree is too large".to_string()))?;
            first_router.push(total);
            routers.push(count);
            per_subtree.push(size);
            total += count;
        }

        Ok(Self {
            levels,
            hosts,
            routers,
            per_subtree,
            first_router,
        })
    }

    pub fn from_params(params: &SubsystemParams) -> Result<Self, TopologyError> {
        Self::parse(shape_text(params, "fattree.shape")?)
    }

    pub fn levels(&self) -> &[FatTreeLevel] {
        &self.levels
    }

    pub fn hosts(&self) -> usize {
        self.hosts
    }

    /// Number of routers at `level`
    pub fn routers_at(&self, level: usize) -> usize {
        self.routers[level]
    }

    pub fn total_routers(&self) -> usize {
        self.routers.iter().sum()
    }

    fn router_index(&self, level: usize, index: usize) -> usize {
        self.first_router[level] + index
    }
}

fn router_name(level: usize, index: usize) -> String {
    format!("rtr.l{}.{}", level, index)
}

impl TopologyGenerator for FatTreeShape {
    fn family(&self) -> TopologyFamily {
        TopologyFamily::FatTree
    }

    fn required_endpoints(&self) -> usize {
        self.hosts
    }

    fn build_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
    ) -> Result<Vec<ComponentId>, BuildError> {
        let mut routers = Vec::with_capacity(self.total_routers());
        for (level, shape) in self.levels.iter().enumerate() {
            for index in 0..self.routers[level] {
                let id = self.router_index(level, index);
                routers.push(router::add_router(
                    graph,
                    fabric,
                    self.family(),
                    &router_name(level, index),
                    id,
                    shape.down + shape.up,
                )?);
            }
        }
        Ok(routers)
    }

    fn placement(&self, node_id: u32) -> Placement {
        let node = node_id as usize;
        let edge = node / self.levels[0].down;
        Placement {
            router: self.router_index(0, edge),
            port: node % self.levels[0].down,
            extra_keys: ExtraKeys::new().with("fattree.edge_router", edge),
        }
    }

    fn wire_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
        routers: &[ComponentId],
    ) -> Result<(), BuildError> {
        let latency = fabric.link_latency.as_str();
        for level in 1..self.levels.len() {
            let below = self.levels[level - 1];
            let lower_per_subtree = self.per_subtree[level - 1];
            let upper_per_subtree = self.per_subtree[level];
            let subtrees = self.routers[level] / upper_per_subtree;

            for subtree in 0..subtrees {
                for child in 0..self.levels[level].down {
                    for r in 0..lower_per_subtree {
                        let lower = (subtree * self.levels[level].down + child) * lower_per_subtree + r;
                        for k in 0..below.up {
                            let upper = subtree * upper_per_subtree + r * below.up + k;
                            graph.connect(
                                &Namespace::root(),
                                &format!("link.l{}.{}:{}.{}", level - 1, lower, level, upper),
                                LinkEndpoint::new(
                                    routers[self.router_index(level - 1, lower)],
                                    router::port_name(below.down + k),
                                    latency,
                                ),
                                LinkEndpoint::new(
                                    routers[self.router_index(level, upper)],
                                    router::port_name(child),
                                    latency,
                                ),
                            )?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

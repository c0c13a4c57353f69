//! N-dimensional torus.
//!
//! Each router sits at a location in a `shape` grid and links to its
//! wrap-around neighbours in every dimension. Per dimension `d` a router has
//! `width[d]` positive-direction ports followed by `width[d]` negative-direction
//! ports; the `local_ports` endpoint ports come after all of them.

use super::links::PendingLinks;
use super::types::{checked_product, parse_dimension_list, shape_count, shape_text};
use super::{router, FabricParams, Placement, TopologyError, TopologyGenerator};
use crate::error::BuildError;
use crate::graph::{ComponentGraph, ComponentId, LinkEndpoint};
use crate::node::ExtraKeys;
use crate::params::{SubsystemParams, TopologyFamily};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorusShape {
    dims: Vec<usize>,
    width: Vec<usize>,
    local_ports: usize,
    routers: usize,
}

impl TorusShape {
    pub fn new(dims: Vec<usize>, width: Vec<usize>, local_ports: usize) -> Result<Self, TopologyError> {
        if dims.is_empty() {
            return Err(TopologyError::UnsupportedShape("torus has no dimensions".to_string()));
        }
        if dims.len() != width.len() {
            return Err(TopologyError::UnsupportedShape(format!(
                "torus shape has {} dimensions but width has {}",
                dims.len(),
                width.len()
            )));
        }
        if dims.contains(&0) || width.contains(&0) {
            return Err(TopologyError::UnsupportedShape(
                "torus sizes and widths must be positive".to_string(),
            ));
        }
        if local_ports == 0 {
            return Err(TopologyError::UnsupportedShape(
                "torus needs at least one local port".to_string(),
            ));
        }
        let routers = checked_product(&dims, "torus router count")?;
        routers
            .checked_mul(local_ports)
            .ok_or_else(|| TopologyError::UnsupportedShape("torus endpoint count is too large".to_string()))?;

        Ok(Self {
            dims,
            width,
            local_ports,
            routers,
        })
    }

    /// Shape from `num_dims`, `torus.shape`, `torus.width` and
    /// `torus.local_ports`
    pub fn from_params(params: &SubsystemParams) -> Result<Self, TopologyError> {
        let num_dims = shape_count(params, "num_dims")?;
        let dims = parse_dimension_list(shape_text(params, "torus.shape")?, "torus shape")?;
        let width = parse_dimension_list(shape_text(params, "torus.width")?, "torus width")?;
        if dims.len() != num_dims {
            return Err(TopologyError::UnsupportedShape(format!(
                "num_dims is {} but torus shape '{}' has {} dimensions",
                num_dims,
                shape_text(params, "torus.shape")?,
                dims.len()
            )));
        }
        Self::new(dims, width, shape_count(params, "torus.local_ports")?)
    }

    pub fn router_count(&self) -> usize {
        self.routers
    }

    /// Ports per router: both directions of every dimension plus local ports
    pub fn ports_per_router(&self) -> usize {
        self.first_local_port() + self.local_ports
    }

    fn first_local_port(&self) -> usize {
        2 * self.width.iter().sum::<usize>()
    }

    /// First positive-direction port of dimension `dim`
    fn first_port(&self, dim: usize) -> usize {
        2 * self.width[..dim].iter().sum::<usize>()
    }

    /// Grid location of router `index`, lowest dimension first
    pub fn location(&self, index: usize) -> Vec<usize> {
        let mut stride = 1;
        self.dims
            .iter()
            .map(|&size| {
                let coordinate = (index / stride) % size;
                stride *= size;
                coordinate
            })
            .collect()
    }

    fn index_of(&self, location: &[usize]) -> usize {
        let mut stride = 1;
        let mut index = 0;
        for (coordinate, size) in location.iter().zip(&self.dims) {
            index += coordinate * stride;
            stride *= size;
        }
        index
    }

    /// Neighbour of router `index` one step along `dim`, wrapping around
    fn neighbour(&self, index: usize, dim: usize, forward: bool) -> usize {
        let mut location = self.location(index);
        let size = self.dims[dim];
        location[dim] = if forward {
            (location[dim] + 1) % size
        } else {
            (location[dim] + size - 1) % size
        };
        self.index_of(&location)
    }

    /// `1x0`-style location string
    pub fn location_name(&self, index: usize) -> String {
        self.location(index)
            .iter()
            .map(|coordinate| coordinate.to_string())
            .collect::<Vec<_>>()
            .join("x")
    }

    fn link_name(&self, dim: usize, from: usize, to: usize, num: usize) -> String {
        format!(
            "link.d{}.{}:{}:{}",
            dim,
            self.location_name(from),
            self.location_name(to),
            num
        )
    }
}

impl TopologyGenerator for TorusShape {
    fn family(&self) -> TopologyFamily {
        TopologyFamily::Torus
    }

    fn required_endpoints(&self) -> usize {
        self.routers * self.local_ports
    }

    fn build_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
    ) -> Result<Vec<ComponentId>, BuildError> {
        let ports = self.ports_per_router();
        let mut routers = Vec::with_capacity(self.routers);
        for index in 0..self.routers {
            let name = format!("rtr.{}", self.location_name(index));
            routers.push(router::add_router(graph, fabric, self.family(), &name, index, ports)?);
        }
        Ok(routers)
    }

    fn placement(&self, node_id: u32) -> Placement {
        let node = node_id as usize;
        let router = node / self.local_ports;
        Placement {
            router,
            port: self.first_local_port() + node % self.local_ports,
            extra_keys: ExtraKeys::new().with("torus.coordinate", self.location_name(router)),
        }
    }

    fn wire_routers(
        &self,
        graph: &mut ComponentGraph,
        fabric: &FabricParams,
        routers: &[ComponentId],
    ) -> Result<(), BuildError> {
        let latency = fabric.link_latency.as_str();
        let mut pending = PendingLinks::new();

        for (index, &router) in routers.iter().enumerate() {
            for dim in 0..self.dims.len() {
                let width = self.width[dim];
                let positive = self.first_port(dim);
                let negative = positive + width;
                let next = self.neighbour(index, dim, true);
                let previous = self.neighbour(index, dim, false);

                for num in 0..width {
                    pending.offer(
                        graph,
                        self.link_name(dim, index, next, num),
                        LinkEndpoint::new(router, router::port_name(positive + num), latency),
                    )?;
                    pending.offer(
                        graph,
                        self.link_name(dim, previous, index, num),
                        LinkEndpoint::new(router, router::port_name(negative + num), latency),
                    )?;
                }
            }
        }
        Ok(pending.finish()?)
    }
}

//! Hand-off of a finished graph to the simulation host.

use super::{ComponentGraph, Link};
use crate::params::SubsystemParams;
use log::debug;

/// One side of a link as the host sees it
#[derive(Debug)]
pub struct HostEndpoint<'a, H> {
    pub component: &'a H,
    pub port: &'a str,
    pub latency: &'a str,
}

/// Component-instantiation and link API of an external simulation host
pub trait SimulationHost {
    /// Host-side reference to an instantiated component
    type Handle;
    type Error: std::error::Error;

    fn create_component(&mut self, name: &str, kind: &str) -> Result<Self::Handle, Self::Error>;

    fn attach_subcomponent(
        &mut self,
        parent: &Self::Handle,
        slot: &str,
        kind: &str,
    ) -> Result<Self::Handle, Self::Error>;

    fn set_parameters(
        &mut self,
        component: &Self::Handle,
        params: &SubsystemParams,
    ) -> Result<(), Self::Error>;

    fn connect(
        &mut self,
        name: &str,
        left: HostEndpoint<'_, Self::Handle>,
        right: HostEndpoint<'_, Self::Handle>,
    ) -> Result<(), Self::Error>;

    /// Keep both ends of the named link on the same partition
    fn set_no_cut(&mut self, link: &str) -> Result<(), Self::Error>;
}

impl ComponentGraph {
    /// Replay the graph into `host` in insertion order and give it up.
    ///
    /// Parents always precede their subcomponents, so every subcomponent is
    /// attached to an already created handle.
    pub fn hand_off<H: SimulationHost>(self, host: &mut H) -> Result<(), H::Error> {
        debug!("Handing off graph: {}", self);
        let mut handles: Vec<H::Handle> = Vec::with_capacity(self.components.len());

        for component in &self.components {
            let handle = match &component.owner {
                None => host.create_component(&component.name, &component.kind)?,
                Some(owner) => host.attach_subcomponent(
                    &handles[owner.parent.index()],
                    &owner.slot,
                    &component.kind,
                )?,
            };
            if !component.params.is_empty() {
                host.set_parameters(&handle, &component.params)?;
            }
            handles.push(handle);
        }

        for Link {
            name,
            left,
            right,
            no_cut,
        } in &self.links
        {
            host.connect(
                name,
                HostEndpoint {
                    component: &handles[left.component.index()],
                    port: &left.port,
                    latency: &left.latency,
                },
                HostEndpoint {
                    component: &handles[right.component.index()],
                    port: &right.port,
                    latency: &right.latency,
                },
            )?;
            if *no_cut {
                host.set_no_cut(name)?;
            }
        }
        Ok(())
    }
}

//! # Rev Cluster - Topology-parameterized cluster builder for xBGAS simulations
//!
//! This library turns a cluster configuration file into the component graph of
//! a multi-node xBGAS simulation: per-node CPU and memory hierarchy, remote
//! memory access chain, and an interconnect fabric of the selected topology.
//! The simulated components themselves (CPU, caches, memory controllers, NICs,
//! routers) live in the external simulation host and are only referenced here
//! by their kind names.
//!
//! ## Overview
//!
//! Data flows strictly downward:
//!
//! 1. **Configuration**: an INI-style file is loaded once into an immutable
//!    [`config::Configuration`].
//! 2. **Parameters**: pure derivers in [`params`] map configuration sections to
//!    typed per-subsystem parameter sets.
//! 3. **Nodes**: a [`node::NodeBuilder`] constructs the component subgraph of one
//!    compute node and returns the handle used to attach it to the fabric.
//! 4. **Fabric**: [`topology::TopologyFabricBuilder`] selects the topology family
//!    (single router, fat-tree, torus, dragonfly), drives the node builder for
//!    every endpoint and wires the resulting handles into the routers.
//! 5. **Graph**: the finished [`graph::ComponentGraph`] is handed to the
//!    simulation host or exported as YAML/JSON.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rev_cluster::config_loader::{load_config, Overrides};
//! use rev_cluster::topology::build_cluster;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("xbgas.cfg"), &Overrides::from_env())?;
//! let graph = build_cluster(&config, 4)?;
//! println!("{graph}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```ini
//! [CPU]
//! clock = 1.0GHz
//! program = foo.exe
//! memSize = 1073741824
//! ...
//!
//! [Torus]
//! num_dims = 2
//! shape = 4x4
//! width = 1x1
//! local_ports = 1
//! ```
//!
//! At most one of `[FatTree]`, `[Torus]` and `[DragonFly]` may be present; when
//! none is, all nodes hang off a single router.
//!
//! ## Error Handling
//!
//! Every module reports failures through its own `thiserror` enum
//! ([`config::ConfigError`], [`topology::TopologyError`], [`graph::GraphError`],
//! [`cli::UsageError`]); construction code funnels them into
//! [`error::BuildError`]. Any error aborts construction and no partial graph is
//! ever returned.

pub mod cli;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod graph;
pub mod node;
pub mod params;
pub mod topology;

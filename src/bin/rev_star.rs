//! Fixed single-router xBGAS cluster.
//!
//! Builds `<nodes>` nodes on one router with the built-in star configuration.
//! The positional program is the target executable of every node unless
//! `REV_EXE` is set.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use log::info;

use rev_cluster::cli;
use rev_cluster::config::{CPU, STAR_DEFAULTS};
use rev_cluster::config_loader::{parse_config, Overrides};
use rev_cluster::graph::write_graph;
use rev_cluster::topology::build_cluster;

#[derive(Parser, Debug)]
#[command(name = "rev-star")]
#[command(about = "Build a single-router xBGAS cluster with built-in defaults")]
#[command(version)]
struct Cli {
    /// Target executable run by every node
    program: String,

    /// Number of nodes
    nodes: u32,

    /// Verbosity: 0 = info, 1 = debug, 2 or more = trace
    #[arg(short, long, default_value_t = 0)]
    verbose: u8,

    /// Write the component graph here (JSON for .json, YAML otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args: Cli = cli::parse_args();
    cli::init_logging(args.verbose);

    let overrides = Overrides::from_env().or_program(&args.program);
    let config = parse_config(STAR_DEFAULTS, &overrides).context("Invalid built-in configuration")?;
    info!(
        "Running {} on {} nodes",
        config.get(CPU, "program").unwrap_or(&args.program),
        args.nodes
    );

    let graph = build_cluster(&config, args.nodes as usize).context("Failed to build cluster")?;
    println!("Built cluster: {}", graph);

    if let Some(output) = &args.output {
        write_graph(&graph, output)?;
        println!("Component graph written to {:?}", output);
    }

    Ok(())
}

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::path::PathBuf;

use rev_cluster::cli;
use rev_cluster::config::DEFAULT_CONFIG_FILE;
use rev_cluster::config_loader::{load_config, Overrides};
use rev_cluster::graph::write_graph;
use rev_cluster::topology::TopologyFabricBuilder;

/// Build the component graph of an xBGAS cluster from a configuration file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the cluster configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity: 0 = info, 1 = debug, 2 or more = trace
    #[arg(short, long, default_value_t = 0)]
    verbose: u8,

    /// Number of nodes on the single router (ignored by generated topologies)
    #[arg(short, long, default_value_t = 2)]
    nodes: usize,

    /// Write the component graph here (JSON for .json, YAML otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args: Args = cli::parse_args();
    cli::init_logging(args.verbose);

    info!("Configuration file: {:?}", args.config);

    let config = load_config(&args.config, &Overrides::from_env())
        .wrap_err_with(|| format!("Failed to load configuration {:?}", args.config))?;

    let graph = TopologyFabricBuilder::new(&config)
        .build(args.nodes)
        .wrap_err("Failed to build cluster")?;

    println!("Built cluster: {}", graph);

    if let Some(output) = &args.output {
        write_graph(&graph, output)?;
        println!("Component graph written to {:?}", output);
    }

    Ok(())
}

//! Parameter sets of the per-node subsystems and the fabric.
//!
//! Integer keys are coerced through the schema in `crate::config::schema`;
//! everything else (clocks, latencies, sizes with units) passes through as a
//! string for the simulation host to interpret.

use super::SubsystemParams;
use crate::config::schema::{
    self, KeySpec, ValueKind, CPU_KEYS, CPU_OPTIONAL_KEYS, LSQ_KEYS, MEMORY_CTRL_KEYS,
    MEMORY_KEYS,
};
use crate::config::{Configuration, ConfigError, CPU, LSQ, MEMORY, MEMORY_CTRL, NETWORK};

/// Arbiter used by every router crossbar
const XBAR_ARBITER: &str = "merlin.xbar_arb_lru";

/// Parameters the link-control interface takes from the fabric set
const LINK_CONTROL_KEYS: &[&str] = &["link_bw", "input_buf_size", "output_buf_size"];

/// Copy a section's schema keys into `params`, coercing by type.
/// CPU-only keys such as `cpu_memctrl_latency` are skipped by the caller.
fn copy_keys(
    params: &mut SubsystemParams,
    config: &Configuration,
    section: &str,
    keys: &[KeySpec],
) -> Result<(), ConfigError> {
    for spec in keys {
        match spec.kind {
            ValueKind::Integer => {
                params.insert(spec.name, schema::lookup_int(config, section, spec.name)?)
            }
            ValueKind::Text => {
                params.insert(spec.name, schema::lookup_text(config, section, spec.name)?)
            }
        }
    }
    Ok(())
}

fn cpu_verbosity(config: &Configuration) -> Result<i64, ConfigError> {
    let (spec, default) = CPU_OPTIONAL_KEYS[0];
    schema::lookup_int_or(config, CPU, spec.name, default)
}

/// Parameters of the `revcpu.RevCPU` component
pub fn derive_cpu_params(config: &Configuration) -> Result<SubsystemParams, ConfigError> {
    let mut params = SubsystemParams::new();
    params.insert("verbose", cpu_verbosity(config)?);
    let cpu_keys: Vec<KeySpec> = CPU_KEYS
        .iter()
        .copied()
        .filter(|spec| spec.name != "cpu_memctrl_latency")
        .collect();
    copy_keys(&mut params, config, CPU, &cpu_keys)?;
    // Suppress the splash banner on every node
    params.insert("splash", 0i64);
    Ok(params)
}

/// Parameters of the local memory-queue (`revcpu.RevBasicMemCtrl`)
pub fn derive_lsq_params(config: &Configuration) -> Result<SubsystemParams, ConfigError> {
    let mut params = SubsystemParams::new();
    params.insert("verbose", cpu_verbosity(config)?);
    params.insert("clock", schema::lookup_text(config, CPU, "clock")?);
    copy_keys(&mut params, config, LSQ, LSQ_KEYS)?;
    Ok(params)
}

/// Parameters of the `memHierarchy.MemController` component
///
/// # Errors
/// `MalformedValue` if `addr_range_start` is not below `addr_range_end`.
pub fn derive_mem_ctrl_params(config: &Configuration) -> Result<SubsystemParams, ConfigError> {
    let mut params = SubsystemParams::new();
    params.insert("verbose", cpu_verbosity(config)?);
    params.insert("clock", schema::lookup_text(config, CPU, "clock")?);
    copy_keys(&mut params, config, MEMORY_CTRL, MEMORY_CTRL_KEYS)?;

    let start = schema::lookup_int(config, MEMORY_CTRL, "addr_range_start")?;
    let end = schema::lookup_int(config, MEMORY_CTRL, "addr_range_end")?;
    schema::check_address_range(start, end)?;

    params.insert("debug", 0i64);
    params.insert("debug_level", 10i64);
    Ok(params)
}

/// Parameters of the `memHierarchy.simpleMem` backend
pub fn derive_memory_params(config: &Configuration) -> Result<SubsystemParams, ConfigError> {
    let mut params = SubsystemParams::new();
    copy_keys(&mut params, config, MEMORY, MEMORY_KEYS)?;
    Ok(params)
}

/// Fabric-wide router parameters, shared by every router port
pub fn derive_network_params(config: &Configuration) -> Result<SubsystemParams, ConfigError> {
    let value = |key: &str| schema::lookup_text(config, NETWORK, key);
    let bandwidth = value("bandwidth")?;

    let params = SubsystemParams::new()
        .with("link_bw", bandwidth)
        .with("link_lat", value("latency")?)
        .with("flit_size", value("flit_size")?)
        .with("xbar_bw", bandwidth)
        .with("input_latency", value("input_latency")?)
        .with("output_latency", value("output_latency")?)
        .with("input_buf_size", value("input_buf_size")?)
        .with("output_buf_size", value("output_buf_size")?)
        .with("xbar_arb", XBAR_ARBITER);
    Ok(params)
}

/// Parameters of a node's `merlin.linkcontrol` interface: bandwidth and
/// buffer sizes from the network section
pub fn derive_link_control_params(config: &Configuration) -> Result<SubsystemParams, ConfigError> {
    Ok(derive_network_params(config)?.subset(LINK_CONTROL_KEYS))
}

/// Latency of the link between a CPU's memory interface and its controller
pub fn local_memory_latency(config: &Configuration) -> Result<String, ConfigError> {
    Ok(schema::lookup_text(config, CPU, "cpu_memctrl_latency")?.to_string())
}

/// Latency of fabric links: node attachment and router-to-router
pub fn fabric_link_latency(config: &Configuration) -> Result<String, ConfigError> {
    Ok(schema::lookup_text(config, NETWORK, "latency")?.to_string())
}

//! Configuration key schema.
//!
//! Lists the keys each section must define and the type every value is
//! coerced to. The loader validates the required sections against these
//! tables; the parameter derivers use the same tables for coercion.

use super::{
    Configuration, ConfigError, CPU, DRAGON_FLY, FAT_TREE, LSQ, MEMORY, MEMORY_CTRL, NETWORK,
    REQUIRED_SECTIONS, TORUS,
};

/// Expected type of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Text,
}

impl ValueKind {
    /// Human readable type name used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Text => "string",
        }
    }
}

/// One key of a section schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub name: &'static str,
    pub kind: ValueKind,
}

const fn int(name: &'static str) -> KeySpec {
    KeySpec {
        name,
        kind: ValueKind::Integer,
    }
}

const fn text(name: &'static str) -> KeySpec {
    KeySpec {
        name,
        kind: ValueKind::Text,
    }
}

pub const CPU_KEYS: &[KeySpec] = &[
    text("clock"),
    text("program"),
    int("memSize"),
    text("startAddr"),
    text("machine"),
    text("memCost"),
    int("enable_xbgas"),
    int("enable_memH"),
    text("cpu_memctrl_latency"),
];

/// Optional CPU keys and their defaults
pub const CPU_OPTIONAL_KEYS: &[(KeySpec, i64)] = &[(int("verbose"), 0)];

pub const LSQ_KEYS: &[KeySpec] = &[
    int("max_loads"),
    int("max_stores"),
    int("max_flush"),
    int("max_llsc"),
    int("max_readlock"),
    int("max_writeunlock"),
    int("max_custom"),
    int("ops_per_cycle"),
];

pub const MEMORY_CTRL_KEYS: &[KeySpec] = &[
    int("addr_range_start"),
    int("addr_range_end"),
    text("backing"),
];

pub const MEMORY_KEYS: &[KeySpec] = &[text("access_time"), text("mem_size")];

pub const NETWORK_KEYS: &[KeySpec] = &[
    text("latency"),
    text("bandwidth"),
    text("flit_size"),
    text("input_latency"),
    text("output_latency"),
    text("input_buf_size"),
    text("output_buf_size"),
];

pub const FAT_TREE_KEYS: &[KeySpec] = &[text("shape")];

pub const TORUS_KEYS: &[KeySpec] = &[
    int("num_dims"),
    text("shape"),
    text("width"),
    int("local_ports"),
];

pub const DRAGON_FLY_KEYS: &[KeySpec] = &[
    int("group_count"),
    int("hosts_per_router"),
    int("routers_per_group"),
    int("intergroup_links"),
];

/// Schema of a known section, `None` for sections without one
pub fn section_keys(section: &str) -> Option<&'static [KeySpec]> {
    match section {
        CPU => Some(CPU_KEYS),
        LSQ => Some(LSQ_KEYS),
        MEMORY_CTRL => Some(MEMORY_CTRL_KEYS),
        MEMORY => Some(MEMORY_KEYS),
        NETWORK => Some(NETWORK_KEYS),
        FAT_TREE => Some(FAT_TREE_KEYS),
        TORUS => Some(TORUS_KEYS),
        DRAGON_FLY => Some(DRAGON_FLY_KEYS),
        _ => None,
    }
}

/// Coerce a raw value to an integer; surrounding whitespace is ignored
pub fn parse_integer(section: &str, key: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse::<i64>().map_err(|_| {
        ConfigError::MalformedValue(
            section.to_string(),
            key.to_string(),
            ValueKind::Integer.describe().to_string(),
        )
    })
}

/// Fetch a required integer value
pub fn lookup_int(config: &Configuration, section: &str, key: &str) -> Result<i64, ConfigError> {
    let raw = config.require(section, key)?;
    parse_integer(section, key, raw)
}

/// Fetch an optional integer value, falling back to `default` when absent
pub fn lookup_int_or(
    config: &Configuration,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match config.get(section, key) {
        Some(raw) => parse_integer(section, key, raw),
        None => Ok(default),
    }
}

/// Fetch a required string value
pub fn lookup_text<'a>(
    config: &'a Configuration,
    section: &str,
    key: &str,
) -> Result<&'a str, ConfigError> {
    config.require(section, key)
}

/// Check that a section is present, defines every schema key, and that each
/// integer key coerces
pub fn validate_section(config: &Configuration, section: &str) -> Result<(), ConfigError> {
    let Some(keys) = section_keys(section) else {
        return Ok(());
    };
    for spec in keys {
        let raw = config.require(section, spec.name)?;
        if spec.kind == ValueKind::Integer {
            parse_integer(section, spec.name, raw)?;
        }
    }
    if section == CPU {
        for (spec, default) in CPU_OPTIONAL_KEYS {
            lookup_int_or(config, section, spec.name, *default)?;
        }
    }
    Ok(())
}

/// Validate every required section in fixed order, then the memory
/// controller's address range
pub fn validate_required(config: &Configuration) -> Result<(), ConfigError> {
    for section in REQUIRED_SECTIONS {
        validate_section(config, section)?;
    }
    let start = lookup_int(config, MEMORY_CTRL, "addr_range_start")?;
    let end = lookup_int(config, MEMORY_CTRL, "addr_range_end")?;
    check_address_range(start, end)
}

/// The memory controller's address range must be non-empty
pub fn check_address_range(start: i64, end: i64) -> Result<(), ConfigError> {
    if start < end {
        Ok(())
    } else {
        Err(ConfigError::MalformedValue(
            MEMORY_CTRL.to_string(),
            "addr_range_end".to_string(),
            format!("integer greater than addr_range_start ({})", start),
        ))
    }
}

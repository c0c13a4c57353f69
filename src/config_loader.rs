use crate::config::{ini, schema, Configuration, ConfigError, CPU};
use log::{info, warn};
use std::env;
use std::path::Path;

/// Environment variable overriding the target executable of every node
pub const REV_EXE_ENV: &str = "REV_EXE";

/// Values that replace configuration file entries at load time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Target executable for every constructed CPU
    pub program: Option<String>,
}

impl Overrides {
    /// No overrides at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Collect overrides from the process environment (`REV_EXE`).
    /// An empty value counts as unset.
    pub fn from_env() -> Self {
        let program = env::var(REV_EXE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self { program }
    }

    /// Use `program` unless a program override is already set
    pub fn or_program(mut self, program: impl Into<String>) -> Self {
        if self.program.is_none() {
            self.program = Some(program.into());
        }
        self
    }
}

/// Load and validate a configuration file
///
/// # Arguments
/// * `config_path` - Path of the INI-style configuration file
/// * `overrides` - Values replacing file entries (e.g. `REV_EXE`)
///
/// # Returns
/// The immutable `Configuration`, or the first problem found:
/// `NotFound` if the file cannot be read, `Syntax` for malformed lines,
/// `MissingSection`/`MissingKey` for schema gaps and `MalformedValue` for
/// values that do not coerce.
pub fn load_config(config_path: &Path, overrides: &Overrides) -> Result<Configuration, ConfigError> {
    info!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::NotFound {
        path: config_path.display().to_string(),
        reason: e.to_string(),
    })?;

    parse_config(&content, overrides)
}

/// Parse and validate configuration text
pub fn parse_config(content: &str, overrides: &Overrides) -> Result<Configuration, ConfigError> {
    let parsed = ini::parse(content)?;
    let mut config = Configuration::from_parts(parsed.sections, parsed.defaults);

    if let Some(program) = &overrides.program {
        if let Some(configured) = config.get(CPU, "program") {
            if configured != program {
                info!(
                    "Target executable '{}' overrides configured program '{}'",
                    program, configured
                );
            }
        }
        config = config.with_value(CPU, "program", program);
    }

    // Ambiguity is rejected when the fabric is built, not here
    let topology_sections = config.topology_sections();
    match topology_sections.as_slice() {
        [] => info!("No topology section present, using a single router"),
        [section] => info!("Detected [{}] topology section", section),
        sections => warn!(
            "Multiple topology sections present: {}",
            sections.join(", ")
        ),
    }

    schema::validate_required(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LSQ, MEMORY_CTRL, TORUS};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[CPU]
clock = 1.0GHz
program = foo.exe
memSize = 1073741824
startAddr = [0:0x00000000]
machine = [0:RV64GCX]
memCost = [0:1:10]
enable_xbgas = 1
enable_memH = 1
cpu_memctrl_latency = 50ps

[LSQ]
max_loads = 64
max_stores = 16
max_flush = 16
max_llsc = 16
max_readlock = 16
max_writeunlock = 16
max_custom = 16
ops_per_cycle = 16

[MemoryCtrl]
addr_range_start = 0
addr_range_end = 1073741823
backing = malloc

[Memory]
access_time = 100ns
mem_size = 8GB

[Network]
latency = 20ns
bandwidth = 10GB/s
flit_size = 32B
input_latency = 50ps
output_latency = 50ps
input_buf_size = 512B
output_buf_size = 512B
"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_load_config() {
        let temp_file = write_temp(MINIMAL);
        let config = load_config(temp_file.path(), &Overrides::none()).unwrap();
        assert_eq!(config.get(CPU, "clock"), Some("1.0GHz"));
        assert_eq!(config.get(LSQ, "max_loads"), Some("64"));
        assert!(config.topology_sections().is_empty());
    }

    #[test]
    fn test_load_is_idempotent() {
        let temp_file = write_temp(MINIMAL);
        let first = load_config(temp_file.path(), &Overrides::none()).unwrap();
        let second = load_config(temp_file.path(), &Overrides::none()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/xbgas.cfg"), &Overrides::none()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_missing_clock() {
        let content = MINIMAL.replace("clock = 1.0GHz\n", "");
        let err = parse_config(&content, &Overrides::none()).unwrap_err();
        assert_eq!(err, ConfigError::MissingKey("CPU".to_string(), "clock".to_string()));
    }

    #[test]
    fn test_missing_section() {
        let content = MINIMAL.replace("[Memory]\n", "[Unused]\n");
        let err = parse_config(&content, &Overrides::none()).unwrap_err();
        assert_eq!(err, ConfigError::MissingSection("Memory".to_string()));
    }

    #[test]
    fn test_malformed_integer() {
        let content = MINIMAL.replace("max_loads = 64", "max_loads = lots");
        let err = parse_config(&content, &Overrides::none()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MalformedValue(LSQ.to_string(), "max_loads".to_string(), "integer".to_string())
        );
    }

    #[test]
    fn test_inverted_address_range() {
        let content = MINIMAL
            .replace("addr_range_start = 0", "addr_range_start = 4096")
            .replace("addr_range_end = 1073741823", "addr_range_end = 1024");
        let err = parse_config(&content, &Overrides::none()).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedValue(s, _, _) if s == MEMORY_CTRL));
    }

    #[test]
    fn test_program_override() {
        let overrides = Overrides {
            program: Some("bar.exe".to_string()),
        };
        let config = parse_config(MINIMAL, &overrides).unwrap();
        assert_eq!(config.get(CPU, "program"), Some("bar.exe"));
    }

    #[test]
    fn test_or_program_keeps_existing_override() {
        let overrides = Overrides {
            program: Some("bar.exe".to_string()),
        }
        .or_program("positional.exe");
        assert_eq!(overrides.program.as_deref(), Some("bar.exe"));

        let overrides = Overrides::none().or_program("positional.exe");
        assert_eq!(overrides.program.as_deref(), Some("positional.exe"));
    }

    #[test]
    fn test_multiple_topology_sections_load() {
        let content = format!(
            "{}\n[FatTree]\nshape = 4\n\n[Torus]\nnum_dims = 1\nshape = 4\nwidth = 1\nlocal_ports = 1\n",
            MINIMAL
        );
        let config = parse_config(&content, &Overrides::none()).unwrap();
        assert_eq!(config.topology_sections(), vec!["FatTree", TORUS]);
    }
}

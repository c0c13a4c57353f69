//! Cluster configuration.
//!
//! A [`Configuration`] is the immutable, section-keyed view of a cluster
//! configuration file. Values are kept as the raw strings found in the file;
//! typed access goes through the key schema in [`schema`] and the derivers in
//! `crate::params`.

pub mod ini;
pub mod schema;

use std::collections::BTreeMap;

/// CPU section name
pub const CPU: &str = "CPU";
/// Local memory-queue section name
pub const LSQ: &str = "LSQ";
/// Memory controller section name
pub const MEMORY_CTRL: &str = "MemoryCtrl";
/// Memory backend section name
pub const MEMORY: &str = "Memory";
/// Network fabric section name
pub const NETWORK: &str = "Network";
/// Fat-tree topology section name
pub const FAT_TREE: &str = "FatTree";
/// Torus topology section name
pub const TORUS: &str = "Torus";
/// Dragonfly topology section name
pub const DRAGON_FLY: &str = "DragonFly";
/// Section whose values act as fallbacks for every other section
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Sections every configuration must carry, in validation order
pub const REQUIRED_SECTIONS: [&str; 5] = [CPU, LSQ, MEMORY_CTRL, MEMORY, NETWORK];

/// Optional topology sections; at most one may be present
pub const TOPOLOGY_SECTIONS: [&str; 3] = [FAT_TREE, TORUS, DRAGON_FLY];

/// Conventional configuration filename used when none is given
pub const DEFAULT_CONFIG_FILE: &str = "xbgas.cfg";

/// Built-in configuration of the fixed single-router (star) cluster
pub const STAR_DEFAULTS: &str = include_str!("../../configs/star.cfg");

/// Key/value pairs of one section; keys are stored lowercase
pub type Section = BTreeMap<String, String>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    NotFound { path: String, reason: String },
    #[error("Syntax error on line {line}: {reason}")]
    Syntax { line: usize, reason: String },
    #[error("Missing required section [{0}]")]
    MissingSection(String),
    #[error("Missing required key '{1}' in section [{0}]")]
    MissingKey(String, String),
    #[error("Malformed value for '{1}' in section [{0}]: expected {2}")]
    MalformedValue(String, String, String),
}

/// Immutable cluster configuration: section name -> key -> raw value.
///
/// Built once by `crate::config_loader` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Configuration {
    sections: BTreeMap<String, Section>,
    defaults: Section,
}

impl Configuration {
    pub(crate) fn from_parts(sections: BTreeMap<String, Section>, defaults: Section) -> Self {
        Self { sections, defaults }
    }

    /// Replace a value in an existing section before the configuration is
    /// handed out. Sections that are absent are left absent.
    pub(crate) fn with_value(mut self, section: &str, key: &str, value: &str) -> Self {
        if let Some(entries) = self.sections.get_mut(section) {
            entries.insert(key.to_lowercase(), value.to_string());
        }
        self
    }

    /// Returns true if the section is present (`DEFAULT` is never reported)
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Names of all present sections in sorted order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Look up a raw value. Keys are case-insensitive; `[DEFAULT]` values fill
    /// in for keys a present section does not define.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let entries = self.sections.get(section)?;
        let key = key.to_lowercase();
        entries
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
    }

    /// Look up a raw value that must be present
    pub fn require(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        if !self.has_section(section) {
            return Err(ConfigError::MissingSection(section.to_string()));
        }
        self.get(section, key)
            .ok_or_else(|| ConfigError::MissingKey(section.to_string(), key.to_string()))
    }

    /// The optional topology sections present in this configuration, in
    /// fixed `FatTree`, `Torus`, `DragonFly` order
    pub fn topology_sections(&self) -> Vec<&'static str> {
        TOPOLOGY_SECTIONS
            .iter()
            .copied()
            .filter(|section| self.has_section(section))
            .collect()
    }
}

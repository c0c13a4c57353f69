//! Topology shape parameters.

use super::SubsystemParams;
use crate::config::schema;
use crate::config::{Configuration, ConfigError, DRAGON_FLY, FAT_TREE, TORUS};
use std::fmt;

/// Routing algorithm requested from dragonfly routers
const DRAGONFLY_ALGORITHM: &str = "minimal";

/// Interconnect topology family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyFamily {
    /// Every node on one router
    SingleRouter,
    /// Multi-level folded Clos network
    FatTree,
    /// N-dimensional wrap-around mesh
    Torus,
    /// Groups of all-to-all routers joined by global links
    DragonFly,
}

impl TopologyFamily {
    /// Configuration section selecting this family, if any
    pub fn section(&self) -> Option<&'static str> {
        match self {
            TopologyFamily::SingleRouter => None,
            TopologyFamily::FatTree => Some(FAT_TREE),
            TopologyFamily::Torus => Some(TORUS),
            TopologyFamily::DragonFly => Some(DRAGON_FLY),
        }
    }

    /// Family selected by a configuration section name
    pub fn from_section(section: &str) -> Option<Self> {
        match section {
            FAT_TREE => Some(TopologyFamily::FatTree),
            TORUS => Some(TopologyFamily::Torus),
            DRAGON_FLY => Some(TopologyFamily::DragonFly),
            _ => None,
        }
    }

    /// Kind of the topology subcomponent every router of this family carries
    pub fn router_topology_kind(&self) -> &'static str {
        match self {
            TopologyFamily::SingleRouter => "merlin.singlerouter",
            TopologyFamily::FatTree => "merlin.fattree",
            TopologyFamily::Torus => "merlin.torus",
            TopologyFamily::DragonFly => "merlin.dragonfly",
        }
    }
}

impl fmt::Display for TopologyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TopologyFamily::SingleRouter => "single router",
            TopologyFamily::FatTree => "fat tree",
            TopologyFamily::Torus => "torus",
            TopologyFamily::DragonFly => "dragonfly",
        };
        write!(f, "{}", name)
    }
}

/// Shape parameters of a topology family, consulting only its own section.
/// The single router has no shape section and yields an empty set.
pub fn derive_shape_params(
    config: &Configuration,
    family: TopologyFamily,
) -> Result<SubsystemParams, ConfigError> {
    let Some(section) = family.section() else {
        return Ok(SubsystemParams::new());
    };
    if !config.has_section(section) {
        return Err(ConfigError::MissingSection(section.to_string()));
    }
    schema::validate_section(config, section)?;

    let params = match family {
        TopologyFamily::SingleRouter => SubsystemParams::new(),
        TopologyFamily::FatTree => SubsystemParams::new().with(
            "fattree.shape",
            schema::lookup_text(config, section, "shape")?,
        ),
        TopologyFamily::Torus => SubsystemParams::new()
            .with("num_dims", schema::lookup_int(config, section, "num_dims")?)
            .with("torus.shape", schema::lookup_text(config, section, "shape")?)
            .with("torus.width", schema::lookup_text(config, section, "width")?)
            .with(
                "torus.local_ports",
                schema::lookup_int(config, section, "local_ports")?,
            ),
        TopologyFamily::DragonFly => {
            let int = |key: &str| schema::lookup_int(config, section, key);
            SubsystemParams::new()
                .with("dragonfly.hosts_per_router", int("hosts_per_router")?)
                .with("dragonfly.routers_per_group", int("routers_per_group")?)
                .with("dragonfly.intergroup_links", int("intergroup_links")?)
                .with("dragonfly.num_groups", int("group_count")?)
                .with("dragonfly.algorithm", DRAGONFLY_ALGORITHM)
        }
    };
    Ok(params)
}

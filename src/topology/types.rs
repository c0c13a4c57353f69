//! Topology type definitions.
//!
//! [`FabricDescriptor`] is resolved once from the configuration: the topology
//! section that is present selects the variant, and its shape parameters are
//! parsed and checked before any component is created.

use super::{DragonFlyShape, FatTreeShape, SingleRouter, TopologyGenerator, TorusShape};
use crate::config::Configuration;
use crate::error::BuildError;
use crate::params::{derive_shape_params, SubsystemParams, TopologyFamily};
use regex::Regex;
use std::sync::LazyLock;

/// Topology selection and shape errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Ambiguous topology: sections {} are all present", .0.join(", "))]
    AmbiguousTopology(Vec<String>),
    #[error("Unsupported topology shape: {0}")]
    UnsupportedShape(String),
    #[error("Topology requires {expected} endpoints but {actual} were built")]
    EndpointCountMismatch { expected: usize, actual: usize },
}

struct ShapePatterns {
    /// `x`-separated list of positive integers, e.g. `4x4x2`
    dimension_list: Regex,
    /// One fat-tree level: `down` or `down,up`
    fat_tree_level: Regex,
}

static PATTERNS: LazyLock<ShapePatterns> = LazyLock::new(|| ShapePatterns {
    dimension_list: Regex::new(r"^\d+(?:x\d+)*$").expect("Invalid dimension list regex"),
    fat_tree_level: Regex::new(r"^(\d+)(?:,(\d+))?$").expect("Invalid fat tree level regex"),
});

fn parse_count(text: &str, what: &str) -> Result<usize, TopologyError> {
    text.parse::<usize>()
        .map_err(|_| TopologyError::UnsupportedShape(format!("{} '{}' is not a count", what, text)))
}

/// Parse an `x`-separated dimension list such as `4x2`
pub(crate) fn parse_dimension_list(text: &str, what: &str) -> Result<Vec<usize>, TopologyError> {
    let text = text.trim();
    if !PATTERNS.dimension_list.is_match(text) {
        return Err(TopologyError::UnsupportedShape(format!(
            "{} '{}' is not an x-separated list of integers",
            what, text
        )));
    }
    text.split('x').map(|part| parse_count(part, what)).collect()
}

/// Parse one `down[,up]` fat-tree level
pub(crate) fn parse_fat_tree_level(text: &str) -> Result<(usize, Option<usize>), TopologyError> {
    let text = text.trim();
    let captures = PATTERNS.fat_tree_level.captures(text).ok_or_else(|| {
        TopologyError::UnsupportedShape(format!("fat tree level '{}' is not 'down' or 'down,up'", text))
    })?;
    let down = parse_count(&captures[1], "fat tree down count")?;
    let up = match captures.get(2) {
        Some(up) => Some(parse_count(up.as_str(), "fat tree up count")?),
        None => None,
    };
    Ok((down, up))
}

/// Product of `values`, rejecting overflow
pub(crate) fn checked_product(values: &[usize], what: &str) -> Result<usize, TopologyError> {
    values
        .iter()
        .try_fold(1usize, |acc, &value| acc.checked_mul(value))
        .ok_or_else(|| TopologyError::UnsupportedShape(format!("{} is too large", what)))
}

fn shape_int(params: &SubsystemParams, key: &str) -> Result<i64, TopologyError> {
    params
        .get_int(key)
        .ok_or_else(|| TopologyError::UnsupportedShape(format!("missing integer '{}'", key)))
}

/// Read a non-negative shape count
pub(crate) fn shape_count(params: &SubsystemParams, key: &str) -> Result<usize, TopologyError> {
    let value = shape_int(params, key)?;
    usize::try_from(value)
        .map_err(|_| TopologyError::UnsupportedShape(format!("'{}' must not be negative, got {}", key, value)))
}

pub(crate) fn shape_text<'a>(params: &'a SubsystemParams, key: &str) -> Result<&'a str, TopologyError> {
    params
        .get_str(key)
        .ok_or_else(|| TopologyError::UnsupportedShape(format!("missing '{}'", key)))
}

/// Active topology family and its parsed shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricDescriptor {
    SingleRouter,
    FatTree(FatTreeShape),
    Torus(TorusShape),
    DragonFly(DragonFlyShape),
}

impl FabricDescriptor {
    /// Select the family from the topology section present in `config`.
    ///
    /// No topology section selects the single router; more than one fails
    /// with `AmbiguousTopology`.
    pub fn resolve(config: &Configuration) -> Result<Self, BuildError> {
        let sections = config.topology_sections();
        let family = match sections.as_slice() {
            [] => return Ok(FabricDescriptor::SingleRouter),
            [section] => TopologyFamily::from_section(section).ok_or_else(|| {
                TopologyError::UnsupportedShape(format!("unknown topology section [{}]", section))
            })?,
            many => {
                return Err(TopologyError::AmbiguousTopology(
                    many.iter().map(|section| section.to_string()).collect(),
                )
                .into())
            }
        };
        let params = derive_shape_params(config, family)?;
        Ok(Self::from_shape_params(family, &params)?)
    }

    /// Parse derived shape parameters into the variant of `family`
    pub fn from_shape_params(
        family: TopologyFamily,
        params: &SubsystemParams,
    ) -> Result<Self, TopologyError> {
        Ok(match family {
            TopologyFamily::SingleRouter => FabricDescriptor::SingleRouter,
            TopologyFamily::FatTree => FabricDescriptor::FatTree(FatTreeShape::from_params(params)?),
            TopologyFamily::Torus => FabricDescriptor::Torus(TorusShape::from_params(params)?),
            TopologyFamily::DragonFly => {
                FabricDescriptor::DragonFly(DragonFlyShape::from_params(params)?)
            }
        })
    }

    pub fn family(&self) -> TopologyFamily {
        match self {
            FabricDescriptor::SingleRouter => TopologyFamily::SingleRouter,
            FabricDescriptor::FatTree(_) => TopologyFamily::FatTree,
            FabricDescriptor::Torus(_) => TopologyFamily::Torus,
            FabricDescriptor::DragonFly(_) => TopologyFamily::DragonFly,
        }
    }

    /// True for families whose endpoint count follows from the shape
    pub fn is_generated(&self) -> bool {
        !matches!(self, FabricDescriptor::SingleRouter)
    }

    /// Endpoints the fabric needs; `node_count` only matters for the
    /// single router
    pub fn required_endpoints(&self, node_count: usize) -> usize {
        match self {
            FabricDescriptor::SingleRouter => node_count,
            FabricDescriptor::FatTree(shape) => shape.required_endpoints(),
            FabricDescriptor::Torus(shape) => shape.required_endpoints(),
            FabricDescriptor::DragonFly(shape) => shape.required_endpoints(),
        }
    }

    /// Generator for this fabric
    ///
    /// # Errors
    /// `UnsupportedShape` for a single router with no ports.
    pub fn generator(&self, node_count: usize) -> Result<Box<dyn TopologyGenerator>, TopologyError> {
        let generator: Box<dyn TopologyGenerator> = match self {
            FabricDescriptor::SingleRouter => Box::new(SingleRouter::new(node_count)?),
            FabricDescriptor::FatTree(shape) => Box::new(shape.clone()),
            FabricDescriptor::Torus(shape) => Box::new(shape.clone()),
            FabricDescriptor::DragonFly(shape) => Box::new(shape.clone()),
        };
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, STAR_DEFAULTS};
    use crate::config_loader::{parse_config, Overrides};

    fn config_with(extra: &str) -> Configuration {
        parse_config(&format!("{}\n{}", STAR_DEFAULTS, extra), &Overrides::none()).unwrap()
    }

    #[test]
    fn test_parse_dimension_list() {
        assert_eq!(parse_dimension_list("4x2x1", "shape").unwrap(), vec![4, 2, 1]);
        assert_eq!(parse_dimension_list("8", "shape").unwrap(), vec![8]);
        assert!(parse_dimension_list("4,2", "shape").is_err());
        assert!(parse_dimension_list("4x", "shape").is_err());
    }

    #[test]
    fn test_parse_fat_tree_level() {
        assert_eq!(parse_fat_tree_level("4,2").unwrap(), (4, Some(2)));
        assert_eq!(parse_fat_tree_level(" 8 ").unwrap(), (8, None));
        assert!(parse_fat_tree_level("4,2,1").is_err());
    }

    #[test]
    fn test_resolve_defaults_to_single_router() {
        let descriptor = FabricDescriptor::resolve(&config_with("")).unwrap();
        assert_eq!(descriptor, FabricDescriptor::SingleRouter);
        assert_eq!(descriptor.required_endpoints(6), 6);
        assert!(!descriptor.is_generated());
    }

    #[test]
    fn test_resolve_rejects_multiple_sections() {
        let config = config_with("[FatTree]\nshape = 4\n\n[Torus]\nnum_dims = 1\nshape = 4\nwidth = 1\nlocal_ports = 1\n");
        let err = FabricDescriptor::resolve(&config).unwrap_err();
        assert_eq!(
            err,
            BuildError::Topology(TopologyError::AmbiguousTopology(vec![
                "FatTree".to_string(),
                "Torus".to_string()
            ]))
        );
    }

    #[test]
    fn test_resolve_fat_tree() {
        let descriptor = FabricDescriptor::resolve(&config_with("[FatTree]\nshape = 4,2:2\n")).unwrap();
        assert_eq!(descriptor.family(), TopologyFamily::FatTree);
        assert_eq!(descriptor.required_endpoints(0), 8);
    }

    #[test]
    fn test_resolve_reports_missing_shape_key() {
        let err = FabricDescriptor::resolve(&config_with("[DragonFly]\ngroup_count = 2\n")).unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::MissingKey(_, _))));
    }

    #[test]
    fn test_single_router_needs_ports() {
        assert!(matches!(
            FabricDescriptor::SingleRouter.generator(0),
            Err(TopologyError::UnsupportedShape(_))
        ));
    }
}

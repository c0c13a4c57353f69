//! Per-subsystem parameter derivation.
//!
//! Every deriver is a pure function of the [`Configuration`](crate::config::Configuration):
//! no hidden state, no caching, and no deriver depends on another's output, so
//! parameter sets can be re-derived at any time and in any order.

pub mod shape;
pub mod subsystem;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub use shape::{derive_shape_params, TopologyFamily};
pub use subsystem::{
    derive_cpu_params, derive_link_control_params, derive_lsq_params, derive_mem_ctrl_params,
    derive_memory_params, derive_network_params, fabric_link_latency, local_memory_latency,
};

/// A typed parameter value handed to a simulation component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            ParamValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(value) => Some(value),
            ParamValue::Int(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => write!(f, "{}", value),
            ParamValue::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

/// Ordered parameter name -> value mapping of one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubsystemParams(BTreeMap<String, ParamValue>);

impl SubsystemParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Merge `overrides` into this set; overriding values win
    pub fn merge(&mut self, overrides: &SubsystemParams) {
        for (name, value) in &overrides.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Copy of the named parameters that are present
    pub fn subset(&self, names: &[&str]) -> SubsystemParams {
        names
            .iter()
            .filter_map(|name| {
                self.get(name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }
}

impl FromIterator<(String, ParamValue)> for SubsystemParams {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_win() {
        let mut base = SubsystemParams::new()
            .with("clock", "1GHz")
            .with("verbose", 0i64);
        let extra = SubsystemParams::new()
            .with("verbose", 5i64)
            .with("torus.coordinate", "1x2");
        base.merge(&extra);

        assert_eq!(base.get_str("clock"), Some("1GHz"));
        assert_eq!(base.get_int("verbose"), Some(5));
        assert_eq!(base.get_str("torus.coordinate"), Some("1x2"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_subset_skips_absent() {
        let params = SubsystemParams::new()
            .with("link_bw", "10GB/s")
            .with("flit_size", "32B");
        let subset = params.subset(&["link_bw", "input_buf_size"]);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.get_str("link_bw"), Some("10GB/s"));
    }

    #[test]
    fn test_values_serialize_untagged() {
        let params = SubsystemParams::new()
            .with("memSize", 1024i64)
            .with("clock", "2GHz");
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"clock":"2GHz","memSize":1024}"#);
    }
}

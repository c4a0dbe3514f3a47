//! Configuration options.
//!
//! A dissector needs very little configuration: the link-layer framing of the capture source, the
//! bitmask every packet starts from, and the layout and byte order of the descriptors it writes.
//! Applications typically keep these in a small TOML file:
//!
//! ```toml
//! datalink = "ethernet"
//! default_bitmask = 0
//! byte_order = "little"
//! descriptor_type = "type2"
//! ```

use crate::dissector::DatalinkType;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Loads a configuration file from `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DissectorConfig> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&config_str)?;
    log::info!("Loaded dissector config from {}: {:?}", path.display(), config);
    Ok(config)
}

/// Parses a configuration from a TOML string. Missing fields take their defaults.
pub fn parse_config(config_str: &str) -> Result<DissectorConfig> {
    let config: DissectorConfig = toml::from_str(config_str).context("Invalid config file")?;
    Ok(config)
}

/// Returns the default configuration: Ethernet framing, an empty default bitmask, native byte
/// order and Type2 descriptors.
pub fn default_config() -> DissectorConfig {
    DissectorConfig::default()
}

/* --------------------------------------------------------------------------------- */

/// Dissector configuration options.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DissectorConfig {
    /// Link-layer framing of captured frames. Defaults to `ethernet`.
    #[serde(default = "default_datalink")]
    pub datalink: DatalinkType,

    /// Protocol-seen bitmask each packet starts from. Defaults to `0`.
    #[serde(default)]
    pub default_bitmask: u64,

    /// Byte order of written descriptors. Defaults to the byte order of the host.
    #[serde(default = "default_byte_order")]
    pub byte_order: ByteOrderKind,

    /// Descriptor layout. Defaults to `type2`.
    #[serde(default = "default_descriptor_type")]
    pub descriptor_type: DescriptorType,
}

impl Default for DissectorConfig {
    fn default() -> Self {
        DissectorConfig {
            datalink: default_datalink(),
            default_bitmask: 0,
            byte_order: default_byte_order(),
            descriptor_type: default_descriptor_type(),
        }
    }
}

fn default_datalink() -> DatalinkType {
    DatalinkType::Ethernet
}

fn default_byte_order() -> ByteOrderKind {
    ByteOrderKind::native()
}

fn default_descriptor_type() -> DescriptorType {
    DescriptorType::Type2
}

/* --------------------------------------------------------------------------------- */

/// Byte order of multi-byte descriptor fields.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrderKind {
    Big,
    Little,
}

impl ByteOrderKind {
    /// Returns the byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrderKind::Big
        } else {
            ByteOrderKind::Little
        }
    }
}

/// Versioned descriptor layouts. Readers must know the layout before interpreting offsets.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorType {
    Type2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_config_parse_full() {
        let config = parse_config(
            r#"
            datalink = "novell_raw"
            default_bitmask = 3
            byte_order = "big"
            descriptor_type = "type2"
            "#,
        )
        .unwrap();
        assert_eq!(config.datalink, DatalinkType::NovellRaw);
        assert_eq!(config.default_bitmask, 3);
        assert_eq!(config.byte_order, ByteOrderKind::Big);
        assert_eq!(config.descriptor_type, DescriptorType::Type2);
    }

    #[test]
    fn core_config_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, default_config());
        assert_eq!(config.byte_order, ByteOrderKind::native());
    }

    #[test]
    fn core_config_rejects_unknown_values() {
        assert!(parse_config(r#"datalink = "token_ring""#).is_err());
        assert!(load_config("/nonexistent/dissector.toml").is_err());
    }
}

//! Build configuration
//!
//! Two behaviors of the source dictionary are deliberately policy-driven
//! rather than hardcoded: what to do when the same type name is registered
//! twice, and what to do when an instance field value matches more than
//! one object name. Both default to the source's observed behavior.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when a type block re-registers an existing type name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Replace the earlier definition, recording a `TypeOverwritten`
    /// diagnostic (the source dictionary's behavior)
    #[default]
    LastWins,
    /// Fail registry construction with `SchemaError::DuplicateType`
    Reject,
}

/// What to do when an instance field value matches several object names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Emit no edge and report every candidate (never guess)
    #[default]
    Drop,
    /// Narrow candidates to types the field's schema declares as valid
    /// targets; emit an edge only if exactly one candidate survives.
    /// Requires a schema registry at instance-graph build time.
    SchemaFiltered,
}

/// Configuration for registry and graph construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub duplicate_types: DuplicatePolicy,
    pub ambiguous_references: AmbiguityPolicy,
}

impl BuildConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_source_behavior() {
        let config = BuildConfig::default();
        assert_eq!(config.duplicate_types, DuplicatePolicy::LastWins);
        assert_eq!(config.ambiguous_references, AmbiguityPolicy::Drop);
    }

    #[test]
    fn parses_partial_toml() {
        // Keys use underscores; an unknown key is rejected, not ignored
        let config = BuildConfig::from_toml_str("duplicate-types = \"reject\"\n");
        assert!(config.is_err());

        let config =
            BuildConfig::from_toml_str("duplicate_types = \"reject\"\n").unwrap();
        assert_eq!(config.duplicate_types, DuplicatePolicy::Reject);
        assert_eq!(config.ambiguous_references, AmbiguityPolicy::Drop);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ambiguous_references = \"schema-filtered\"").unwrap();
        let config = BuildConfig::load(file.path()).unwrap();
        assert_eq!(config.ambiguous_references, AmbiguityPolicy::SchemaFiltered);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = BuildConfig {
            duplicate_types: DuplicatePolicy::Reject,
            ambiguous_references: AmbiguityPolicy::SchemaFiltered,
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(BuildConfig::from_toml_str(&text).unwrap(), config);
    }
}

//! TOML configuration of backend selection.
//!
//! Instead of assembling a [`BackendRegistry`] by hand, callers can describe
//! it in a config file:
//!
//! ```toml
//! # openpmd.toml
//! [backends]
//! strict = true
//! bp_engine = "adios2"
//!
//! [json]
//! pretty = false
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::io::{BackendRegistry, Format};

/// Errors raised while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unexpected keys
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// ADIOS generation serving `.bp` files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BpEngine {
    /// ADIOS1
    #[default]
    Adios1,
    /// ADIOS2
    Adios2,
}

impl BpEngine {
    /// Storage format `.bp` files map to
    pub fn format(self) -> Format {
        match self {
            BpEngine::Adios1 => Format::Adios1,
            BpEngine::Adios2 => Format::Adios2,
        }
    }
}

/// Root configuration structure for openpmd.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Backend selection settings.
    #[serde(default)]
    pub backends: BackendConfig,

    /// JSON backend settings.
    #[serde(default)]
    pub json: JsonConfig,
}

/// Configuration of the backend registry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Register failing stubs for native backends missing from this build.
    /// Without them, such formats degrade to the no-op backend.
    pub strict: Option<bool>,

    /// Engine serving `.bp` files.
    pub bp_engine: Option<BpEngine>,
}

/// Configuration of the JSON backend.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonConfig {
    /// Pretty-print written documents.
    pub pretty: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Whether native stubs are registered (default: yes)
    pub fn strict(&self) -> bool {
        self.backends.strict.unwrap_or(true)
    }

    /// Engine serving `.bp` files (default: ADIOS1)
    pub fn bp_engine(&self) -> BpEngine {
        self.backends.bp_engine.unwrap_or_default()
    }

    /// Whether JSON documents are pretty-printed (default: yes)
    pub fn json_pretty(&self) -> bool {
        self.json.pretty.unwrap_or(true)
    }

    /// Backend registry described by this configuration
    pub fn registry(&self) -> BackendRegistry {
        BackendRegistry::builtin(self.strict(), self.json_pretty())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    /// Parse configuration from a TOML string.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Parallelism;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [backends]
            strict = false
            bp_engine = "adios2"

            [json]
            pretty = false
        "#;

        let config: Config = toml.parse().unwrap();
        assert!(!config.strict());
        assert_eq!(config.bp_engine(), BpEngine::Adios2);
        assert_eq!(config.bp_engine().format(), Format::Adios2);
        assert!(!config.json_pretty());

        let registry = config.registry();
        assert!(registry.is_registered(Format::Json, Parallelism::Serial));
        assert!(!registry.is_registered(Format::Hdf5, Parallelism::Serial));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = "".parse().unwrap();
        assert!(config.strict());
        assert_eq!(config.bp_engine(), BpEngine::Adios1);
        assert!(config.json_pretty());
        assert!(config
            .registry()
            .is_registered(Format::Hdf5, Parallelism::Parallel));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            "[backends]\nbp_engine = \"adios3\"".parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            "[backend]\nstrict = true".parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/openpmd.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

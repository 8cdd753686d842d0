use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::LoadError;
use crate::runtime::harness::HarnessIdentity;

pub const DEFAULT_MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024;

/// Runner settings, read from a JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Identifier the harness object is bound to in test sources.
    pub harness_name: String,
    /// Declared type of the harness object, as solc prints it.
    pub harness_type: String,
    /// Functions whose names match this regex are tests.
    pub test_pattern: String,
    /// Upper bound, in bytes, on the AST and source files we read.
    pub max_source_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        let identity = HarnessIdentity::default();
        Self {
            harness_name: identity.name,
            harness_type: identity.type_name,
            test_pattern: "^test".to_string(),
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        // Surface a bad pattern at load time rather than at first use.
        config.test_regex()?;
        Ok(config)
    }

    pub fn identity(&self) -> HarnessIdentity {
        HarnessIdentity {
            name: self.harness_name.clone(),
            type_name: self.harness_type.clone(),
        }
    }

    pub fn test_regex(&self) -> Result<Regex, LoadError> {
        Ok(Regex::new(&self.test_pattern)?)
    }
}

//! Optional project configuration file.
//!
//! A project may carry an `eapi.yaml` next to its manifests:
//!
//! ```yaml
//! plugin: declared
//! module: example.com/shop
//! depends:
//!   - example.com/common/types
//! output: docs/openapi.yaml
//! openapi:
//!   title: Shop API
//!   version: 2.1.0
//! ```
//!
//! Every key is optional. Command-line flags take precedence over the file.

use crate::definition::IndexScope;
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "eapi.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Route extractor name
    pub plugin: Option<String>,
    /// Entry module path; only packages below it (and `depends`) are indexed
    pub module: Option<String>,
    /// Extra package path prefixes to index
    pub depends: Vec<String>,
    pub output: Option<PathBuf>,
    pub openapi: OpenApiConfig,
}

/// Values for the document's info section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

impl Config {
    /// Load a configuration file.
    ///
    /// An empty file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config: {}", path.display());
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay command-line values onto this configuration.
    ///
    /// Scalars given on the command line replace the file's; `depends`
    /// entries are appended after the file's, without duplicates.
    pub fn merge(
        mut self,
        plugin: Option<String>,
        module: Option<String>,
        depends: Vec<String>,
        output: Option<PathBuf>,
    ) -> Self {
        if plugin.is_some() {
            self.plugin = plugin;
        }
        if module.is_some() {
            self.module = module;
        }
        if output.is_some() {
            self.output = output;
        }
        for dep in depends {
            if !self.depends.contains(&dep) {
                self.depends.push(dep);
            }
        }
        self
    }

    pub fn index_scope(&self) -> IndexScope {
        IndexScope {
            module: self.module.clone(),
            depends: self.depends.clone(),
        }
    }
}

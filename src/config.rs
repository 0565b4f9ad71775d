//! Configuration management for the schema registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml)
//! - Environment variables (SCHEMAS__*)
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [store]
//! path = "./data/schemas.json"
//!
//! [validation]
//! format_assertions = true
//! dialect = "https://json-schema.org/draft/2020-12/schema"
//!
//! [pagination]
//! default_page_size = 20
//! max_page_size = 100
//! ```

use std::path::PathBuf;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::compiler::{Draft202012Compiler, DRAFT_2020_12};
use crate::error::{RegistryError, Result};
use crate::store::PageRequest;

/// Main configuration for the schema registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Where the CLIs keep their snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat `format` as an assertion rather than an annotation
    #[serde(default = "default_true")]
    pub format_assertions: bool,

    /// Dialect required in `$schema`; only draft 2020-12 is supported
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("schemas.json")
}

fn default_true() -> bool {
    true
}

fn default_dialect() -> String {
    DRAFT_2020_12.to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            format_assertions: true,
            dialect: default_dialect(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["schemas.toml", ".schemas.toml", "config/schemas.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "tenant-schemas", "schemas") {
            let xdg_config = dirs.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMAS__VALIDATION__FORMAT_ASSERTIONS=false
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Build the schema compiler these settings describe
    pub fn compiler(&self) -> Result<Draft202012Compiler> {
        if self.validation.dialect != DRAFT_2020_12 {
            return Err(RegistryError::InvalidRequest {
                detail: format!(
                    "unsupported dialect '{}', only '{}' is supported",
                    self.validation.dialect, DRAFT_2020_12
                ),
            });
        }
        Ok(Draft202012Compiler::new().with_format_assertions(self.validation.format_assertions))
    }

    /// Resolve a requested page, applying the default size and the cap
    pub fn page_request(&self, page: usize, size: Option<usize>) -> PageRequest {
        let size = size
            .unwrap_or(self.pagination.default_page_size)
            .clamp(1, self.pagination.max_page_size.max(1));
        PageRequest::of(page, size)
    }

    /// Snapshot path, resolved against the working directory
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.store.path)
        }
    }
}

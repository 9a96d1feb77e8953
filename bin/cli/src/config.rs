//! Command-line configuration.
//!
//! Loaded via the `config` crate from an optional file and then from
//! `TAILOR_`-prefixed environment variables, with `__` separating nested
//! keys (for example `TAILOR_LAYOUT__COLUMNS=4`).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tailor_ai::{HttpGeneratorConfig, ImportPolicy};
use tailor_layout::{GridLayoutConfig, SizeHints};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CliConfig {
    /// Template catalog file. The built-in catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    #[serde(default)]
    pub layout: LayoutSettings,

    #[serde(default)]
    pub import: ImportSettings,

    #[serde(default)]
    pub generator: GeneratorSettings,
}

/// Grid geometry and node size hints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutSettings {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_origin")]
    pub origin_x: f64,
    #[serde(default = "default_origin")]
    pub origin_y: f64,
    #[serde(default = "default_column_spacing")]
    pub column_spacing: f64,
    #[serde(default = "default_row_spacing")]
    pub row_spacing: f64,
    #[serde(default = "default_node_width")]
    pub node_width: f64,
    #[serde(default = "default_node_height")]
    pub node_height: f64,
}

fn default_columns() -> usize {
    3
}

fn default_origin() -> f64 {
    80.0
}

fn default_column_spacing() -> f64 {
    200.0
}

fn default_row_spacing() -> f64 {
    120.0
}

fn default_node_width() -> f64 {
    160.0
}

fn default_node_height() -> f64 {
    60.0
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            origin_x: default_origin(),
            origin_y: default_origin(),
            column_spacing: default_column_spacing(),
            row_spacing: default_row_spacing(),
            node_width: default_node_width(),
            node_height: default_node_height(),
        }
    }
}

impl LayoutSettings {
    #[must_use]
    pub fn grid(&self) -> GridLayoutConfig {
        GridLayoutConfig {
            columns: self.columns,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            column_spacing: self.column_spacing,
            row_spacing: self.row_spacing,
        }
    }

    #[must_use]
    pub fn size_hints(&self) -> SizeHints {
        SizeHints {
            width: self.node_width,
            height: self.node_height,
        }
    }
}

/// Draft acceptance settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportSettings {
    /// Drafts below this confidence are rejected.
    #[serde(default)]
    pub min_confidence: f64,
}

impl ImportSettings {
    #[must_use]
    pub fn policy(&self) -> ImportPolicy {
        ImportPolicy {
            min_confidence: self.min_confidence,
        }
    }
}

/// Draft generation service settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorSettings {
    /// Generation endpoint. Generation is unavailable when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Whole-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeneratorSettings {
    /// Returns the HTTP generator config, if an endpoint is configured.
    #[must_use]
    pub fn http(&self) -> Option<HttpGeneratorConfig> {
        self.endpoint.as_ref().map(|endpoint| {
            HttpGeneratorConfig::new(endpoint.clone())
                .with_timeout(Duration::from_secs(self.timeout_secs))
        })
    }
}

impl CliConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(None)
    }

    /// Loads configuration from an optional file, overridden by the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file));
        }
        builder
            .add_source(
                config::Environment::with_prefix("TAILOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

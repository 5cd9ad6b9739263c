//! Configuration schema definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Entry specification: a single path, or a table of entry name to path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(String),
    Named(IndexMap<String, String>),
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig::Named(IndexMap::new())
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the context root
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Filename template; `[name]` and `[contenthash]` are substituted
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_filename(),
        }
    }
}

fn default_output_path() -> String {
    "dist".to_string()
}

fn default_filename() -> String {
    "[name].js".to_string()
}

/// Resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Extensions probed in order when a specifier has none
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_string(), ".json".to_string()]
}

/// A single loader rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regex matched against the module path
    pub pattern: String,

    /// Shorthand for a single loader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,

    /// Loader chain, composed right to left
    #[serde(default, rename = "use")]
    pub use_: Vec<String>,
}

impl RuleConfig {
    /// The effective loader chain for this rule.
    pub fn loaders(&self) -> Vec<String> {
        match &self.loader {
            Some(loader) => vec![loader.clone()],
            None => self.use_.clone(),
        }
    }
}

/// Module processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

//! Configuration handling
//!
//! Parses packlet.toml files and applies `key=value` command-line
//! overrides on top.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::utils::normalize_path;

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Build mode, "development" or "production". Informational only.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Root directory entries are resolved against; relative values are
    /// resolved against the config file's directory.
    #[serde(default)]
    pub context: Option<String>,

    /// Entry points
    #[serde(default)]
    pub entry: EntryConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Resolution configuration
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Loader rules
    #[serde(default)]
    pub module: ModuleConfig,

    /// Directory containing the config file (computed at load)
    #[serde(skip)]
    pub base: PathBuf,
}

fn default_mode() -> String {
    "development".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| Error::io(path, e))?
                .join(path)
        };

        let content = fs::read_to_string(&absolute).map_err(|e| Error::io(&absolute, e))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::config(format!("failed to parse {}: {e}", absolute.display())))?;

        config.base = normalize_path(
            absolute
                .parent()
                .unwrap_or_else(|| Path::new(".")),
        );

        Ok(config)
    }

    /// Create a configuration programmatically, rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            mode: default_mode(),
            context: None,
            entry: EntryConfig::default(),
            output: OutputConfig::default(),
            resolve: ResolveConfig::default(),
            module: ModuleConfig::default(),
            base: base.into(),
        }
    }

    /// Merge `key=value` overrides, shallowly, over this configuration.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in overrides {
            let Some((key, value)) = token.split_once('=') else {
                return Err(Error::config(format!(
                    "override '{token}' is not of the form key=value"
                )));
            };
            match key {
                "mode" => self.mode = value.to_string(),
                "context" => self.context = Some(value.to_string()),
                "entry" => self.entry = EntryConfig::Single(value.to_string()),
                "output.path" => self.output.path = value.to_string(),
                "output.filename" => self.output.filename = value.to_string(),
                other => warn!("ignoring unknown configuration override '{other}'"),
            }
        }
        Ok(())
    }

    /// The root directory entry paths and output paths resolve against.
    pub fn context_dir(&self) -> PathBuf {
        match &self.context {
            Some(context) => normalize_path(&self.base.join(context)),
            None => self.base.clone(),
        }
    }

    /// Resolved `(name, absolute path)` entry pairs.
    ///
    /// A single-path entry gets the name "main". Paths are normalized
    /// against the context root.
    pub fn entry_points(&self) -> Result<Vec<(String, PathBuf)>> {
        let root = self.context_dir();
        let pairs: Vec<(String, String)> = match &self.entry {
            EntryConfig::Single(path) => vec![("main".to_string(), path.clone())],
            EntryConfig::Named(map) => map
                .iter()
                .map(|(name, path)| (name.clone(), path.clone()))
                .collect(),
        };

        if pairs.is_empty() {
            return Err(Error::config("at least one entry must be configured"));
        }

        Ok(pairs
            .into_iter()
            .map(|(name, path)| {
                let absolute = normalize_path(&root.join(&path));
                (name, absolute)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_entry() {
        let config: Config = toml::from_str(
            r#"
            entry = "src/entry.js"
            "#,
        )
        .unwrap();

        let mut config = config;
        config.base = PathBuf::from("/project");

        let entries = config.entry_points().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "main");
        assert_eq!(entries[0].1, PathBuf::from("/project/src/entry.js"));
    }

    #[test]
    fn test_parse_named_entries_keep_order() {
        let config: Config = toml::from_str(
            r#"
            [entry]
            app = "src/app.js"
            admin = "src/admin.js"
            "#,
        )
        .unwrap();

        let mut config = config;
        config.base = PathBuf::from("/project");

        let entries = config.entry_points().unwrap();
        let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["app", "admin"]);
    }

    #[test]
    fn test_missing_entry_is_config_error() {
        let config = Config::new("/project");
        let err = config.entry_points().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_context_overrides_base() {
        let mut config = Config::new("/project");
        config.context = Some("packages/web".to_string());
        assert_eq!(config.context_dir(), PathBuf::from("/project/packages/web"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::new("/project");
        config
            .apply_overrides(["mode=production", "output.path=build", "output.filename=[name].bundle.js"])
            .unwrap();
        assert_eq!(config.mode, "production");
        assert_eq!(config.output.path, "build");
        assert_eq!(config.output.filename, "[name].bundle.js");
    }

    #[test]
    fn test_malformed_override_is_config_error() {
        let mut config = Config::new("/project");
        let err = config.apply_overrides(["nonsense"]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rule_loader_shorthand() {
        let rule = RuleConfig {
            pattern: r"\.json$".to_string(),
            loader: Some("json".to_string()),
            use_: Vec::new(),
        };
        assert_eq!(rule.loaders(), ["json"]);

        let rule = RuleConfig {
            pattern: r"\.css$".to_string(),
            loader: None,
            use_: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(rule.loaders(), ["a", "b"]);
    }
}

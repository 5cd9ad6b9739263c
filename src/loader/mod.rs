//! Loader pipeline
//!
//! Applies configured text transforms to raw module source before
//! analysis. The first rule whose pattern matches a module's path applies;
//! its loader chain composes right to left, so the last loader in the
//! chain sees the raw text and the first produces the final output.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::RuleConfig;
use crate::error::{Error, Result};
use crate::utils::to_unix_path;

/// A loader is a pure text transform.
pub type LoaderFn = Arc<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

struct Rule {
    pattern: Regex,
    names: Vec<String>,
    loaders: Vec<LoaderFn>,
}

/// Ordered loader rules for one compilation.
#[derive(Default)]
pub struct LoaderPipeline {
    rules: Vec<Rule>,
}

impl std::fmt::Debug for LoaderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderPipeline")
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Built-in loaders that config rules reference by name.
static BUILTIN_LOADERS: Lazy<HashMap<&'static str, LoaderFn>> = Lazy::new(|| {
    let mut loaders: HashMap<&'static str, LoaderFn> = HashMap::new();
    loaders.insert("json", Arc::new(builtin::json));
    loaders.insert("css", Arc::new(builtin::css));
    loaders
});

impl LoaderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from configuration rules naming built-in loaders.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self> {
        let mut pipeline = Self::new();
        for rule in rules {
            let mut names = Vec::new();
            let mut loaders = Vec::new();
            for name in rule.loaders() {
                let loader = BUILTIN_LOADERS
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| Error::config(format!("unknown loader '{name}'")))?;
                names.push(name);
                loaders.push(loader);
            }
            pipeline.add_rule_named(&rule.pattern, names, loaders)?;
        }
        Ok(pipeline)
    }

    /// Register a rule with a custom loader chain.
    pub fn add_rule(&mut self, pattern: &str, loaders: Vec<LoaderFn>) -> Result<()> {
        let names = (0..loaders.len()).map(|i| format!("loader#{i}")).collect();
        self.add_rule_named(pattern, names, loaders)
    }

    fn add_rule_named(
        &mut self,
        pattern: &str,
        names: Vec<String>,
        loaders: Vec<LoaderFn>,
    ) -> Result<()> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::config(format!("invalid rule pattern '{pattern}': {e}")))?;
        self.rules.push(Rule {
            pattern,
            names,
            loaders,
        });
        Ok(())
    }

    /// Run the first matching rule's loader chain over `source`.
    ///
    /// Source passes through unchanged when no rule matches.
    pub fn apply(&self, source: &str, path: &Path) -> Result<String> {
        let unix_path = to_unix_path(path);
        let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(&unix_path)) else {
            return Ok(source.to_string());
        };

        debug!("applying {} loader(s) to '{}'", rule.loaders.len(), unix_path);

        let mut text = source.to_string();
        for (index, loader) in rule.loaders.iter().enumerate().rev() {
            text = loader(&text).map_err(|cause| Error::Loader {
                name: rule.names[index].clone(),
                index,
                path: path.to_path_buf(),
                message: format!("{cause:#}"),
            })?;
        }
        Ok(text)
    }
}

mod builtin {
    //! Built-in loaders.

    use anyhow::Context;

    /// Validate JSON and wrap it as a CommonJS module.
    pub(super) fn json(source: &str) -> anyhow::Result<String> {
        serde_json::from_str::<serde_json::Value>(source).context("invalid JSON")?;
        Ok(format!("module.exports = {source};\n"))
    }

    /// Wrap a stylesheet as a module that injects a style tag.
    pub(super) fn css(source: &str) -> anyhow::Result<String> {
        let escaped = source
            .replace('\\', "\\\\")
            .replace('`', "\\`")
            .replace("${", "\\${");
        Ok(format!(
            "(function() {{\n  var style = document.createElement('style');\n  style.textContent = `{escaped}`;\n  document.head.appendChild(style);\n}})();\nmodule.exports = {{}};\n"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn append(suffix: &'static str) -> LoaderFn {
        Arc::new(move |text: &str| Ok(format!("{text}{suffix}")))
    }

    #[test]
    fn test_loaders_compose_right_to_left() {
        let mut pipeline = LoaderPipeline::new();
        pipeline
            .add_rule(r"\.js$", vec![append("A"), append("B")])
            .unwrap();

        let out = pipeline.apply("X", Path::new("/p/mod.js")).unwrap();
        assert_eq!(out, "XBA");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut pipeline = LoaderPipeline::new();
        pipeline.add_rule(r"\.js$", vec![append("1")]).unwrap();
        pipeline.add_rule(r"mod", vec![append("2")]).unwrap();

        let out = pipeline.apply("X", Path::new("/p/mod.js")).unwrap();
        assert_eq!(out, "X1");
    }

    #[test]
    fn test_no_match_passes_through() {
        let mut pipeline = LoaderPipeline::new();
        pipeline.add_rule(r"\.css$", vec![append("A")]).unwrap();

        let out = pipeline.apply("X", Path::new("/p/mod.js")).unwrap();
        assert_eq!(out, "X");
    }

    #[test]
    fn test_failed_loader_reports_index() {
        let failing: LoaderFn = Arc::new(|_: &str| Err(anyhow!("boom")));
        let mut pipeline = LoaderPipeline::new();
        pipeline.add_rule(r"\.js$", vec![append("A"), failing]).unwrap();

        let err = pipeline.apply("X", Path::new("/p/mod.js")).unwrap_err();
        match err {
            Error::Loader { index, path, message, .. } => {
                assert_eq!(index, 1);
                assert_eq!(path, Path::new("/p/mod.js"));
                assert!(message.contains("boom"));
            }
            other => panic!("expected loader error, got {other}"),
        }
    }

    #[test]
    fn test_builtin_json() {
        let pipeline = LoaderPipeline::from_config(&[RuleConfig {
            pattern: r"\.json$".to_string(),
            loader: Some("json".to_string()),
            use_: Vec::new(),
        }])
        .unwrap();

        let out = pipeline
            .apply(r#"{"answer": 42}"#, Path::new("/p/data.json"))
            .unwrap();
        assert_eq!(out, "module.exports = {\"answer\": 42};\n");
    }

    #[test]
    fn test_builtin_json_rejects_invalid() {
        let pipeline = LoaderPipeline::from_config(&[RuleConfig {
            pattern: r"\.json$".to_string(),
            loader: Some("json".to_string()),
            use_: Vec::new(),
        }])
        .unwrap();

        let err = pipeline.apply("{nope", Path::new("/p/data.json")).unwrap_err();
        assert!(matches!(err, Error::Loader { .. }));
    }

    #[test]
    fn test_builtin_css_wraps_stylesheet() {
        let pipeline = LoaderPipeline::from_config(&[RuleConfig {
            pattern: r"\.css$".to_string(),
            loader: Some("css".to_string()),
            use_: Vec::new(),
        }])
        .unwrap();

        let out = pipeline
            .apply("body { color: red; }", Path::new("/p/app.css"))
            .unwrap();
        assert!(out.contains("document.createElement('style')"));
        assert!(out.contains("body { color: red; }"));
        assert!(out.contains("module.exports = {};"));
    }

    #[test]
    fn test_unknown_builtin_is_config_error() {
        let err = LoaderPipeline::from_config(&[RuleConfig {
            pattern: r"\.js$".to_string(),
            loader: Some("does-not-exist".to_string()),
            use_: Vec::new(),
        }])
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

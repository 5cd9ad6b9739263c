//! Module resolution
//!
//! Maps raw import specifiers to absolute file paths using extension
//! probing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::utils::normalize_path;

/// Module resolver
pub struct Resolver {
    /// Extensions probed in configured order, each with a leading dot.
    extensions: Vec<String>,
}

impl Resolver {
    /// Create a new resolver from the configured extension list.
    pub fn new(extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext.clone()
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { extensions }
    }

    /// Resolve `specifier` against `from_dir`.
    ///
    /// Probes the literal joined path first, then the path with each
    /// configured extension appended, in order. If the literal path is a
    /// directory, the same probing runs against `<path>/index`.
    pub fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf> {
        let target = from_dir.join(specifier);

        if let Some(found) = self.probe(&target) {
            debug!("resolved '{}' -> '{}'", specifier, found.display());
            return Ok(found);
        }

        if target.is_dir() {
            if let Some(found) = self.probe(&target.join("index")) {
                debug!("resolved '{}' -> '{}'", specifier, found.display());
                return Ok(found);
            }
        }

        Err(Error::Resolution {
            specifier: specifier.to_string(),
            from: from_dir.to_path_buf(),
        })
    }

    /// Try the literal path, then the path with each extension appended.
    fn probe(&self, target: &Path) -> Option<PathBuf> {
        if target.is_file() {
            return Some(normalize_path(target));
        }

        let base: OsString = target.as_os_str().to_os_string();
        for ext in &self.extensions {
            let mut candidate = base.clone();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(normalize_path(&candidate));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_literal_path_wins() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "dep.js");

        let resolver = Resolver::new(&[".js".to_string()]);
        let resolved = resolver.resolve("./dep.js", tmp.path()).unwrap();
        assert_eq!(resolved, normalize_path(&file));
    }

    #[test]
    fn test_extensions_probed_in_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "dep.ts");
        let js = touch(tmp.path(), "dep.js");

        let resolver = Resolver::new(&[".js".to_string(), ".ts".to_string()]);
        let resolved = resolver.resolve("./dep", tmp.path()).unwrap();
        assert_eq!(resolved, normalize_path(&js));
    }

    #[test]
    fn test_extension_appended_not_replaced() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "dep.config.js");

        let resolver = Resolver::new(&[".js".to_string()]);
        let resolved = resolver.resolve("./dep.config", tmp.path()).unwrap();
        assert_eq!(resolved, normalize_path(&file));
    }

    #[test]
    fn test_directory_index_fallback() {
        let tmp = TempDir::new().unwrap();
        let index = touch(tmp.path(), "lib/index.js");

        let resolver = Resolver::new(&[".js".to_string()]);
        let resolved = resolver.resolve("./lib", tmp.path()).unwrap();
        assert_eq!(resolved, normalize_path(&index));
    }

    #[test]
    fn test_unresolvable_specifier() {
        let tmp = TempDir::new().unwrap();

        let resolver = Resolver::new(&[".js".to_string()]);
        let err = resolver.resolve("./missing", tmp.path()).unwrap_err();
        match err {
            Error::Resolution { specifier, from } => {
                assert_eq!(specifier, "./missing");
                assert_eq!(from, tmp.path());
            }
            other => panic!("expected resolution error, got {other}"),
        }
    }

    #[test]
    fn test_extensions_accept_missing_dot() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "dep.js");

        let resolver = Resolver::new(&["js".to_string()]);
        assert!(resolver.resolve("./dep", tmp.path()).is_ok());
    }
}

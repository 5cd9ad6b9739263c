//! Error types for the bundler
//!
//! Any of these aborts the whole compilation: no partial module graph is
//! kept and no partial assets are written. Re-running after fixing the
//! cause recompiles from scratch.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can make a compilation fail.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid entry/output configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A specifier did not resolve against the configured extensions.
    #[error("cannot resolve '{}' from directory '{}'", .specifier, .from.display())]
    Resolution { specifier: String, from: PathBuf },

    /// Malformed source text.
    #[error("parse error in '{}' at line {}, column {}: {}", .path.display(), .line, .column, .message)]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// The dependency call was given something other than a single string
    /// literal.
    #[error("dynamic dependency in '{}' at line {}, column {}: require() accepts only a string literal", .path.display(), .line, .column)]
    UnsupportedDynamicDependency {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    /// A loader transform failed.
    #[error("loader '{}' (index {}) failed on '{}': {}", .name, .index, .path.display(), .message)]
    Loader {
        name: String,
        index: usize,
        path: PathBuf,
        message: String,
    },

    /// Read or write failure.
    #[error("i/o error on '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

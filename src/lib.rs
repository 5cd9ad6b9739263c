//! Packlet library
//!
//! Core bundling pipeline: configuration, module resolution, loaders,
//! dependency analysis, module-graph construction, and bundle emission.

pub mod analyzer;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod loader;
pub mod plugins;
pub mod resolver;
pub mod utils;

pub use cli::Cli;
pub use compiler::{Compiler, Stats, RUNTIME_REQUIRE};
pub use config::Config;
pub use error::{Error, Result};

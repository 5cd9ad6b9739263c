//! Core compiler
//!
//! Drives the whole pipeline: entry resolution, recursive module graph
//! construction, chunk assembly, code generation, and asset emission, with
//! lifecycle hooks dispatched along the way. One `Compiler` owns all state
//! for a single run; independent compilations never share anything.

mod chunk;
mod codegen;
mod graph;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::{LoaderFn, LoaderPipeline};
use crate::plugins::{HookDispatcher, HookKind, Plugin};
use crate::resolver::Resolver;
use crate::utils::{hash_content, module_id, normalize_path};

pub use chunk::Chunk;
pub use codegen::RUNTIME_REQUIRE;
pub use graph::{Module, ModuleGraph, ModuleState};

/// A named root source file from which a module graph is discovered.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPoint {
    pub name: String,
    pub path: PathBuf,
}

/// Snapshot of a finished compilation.
#[derive(Debug, Serialize)]
pub struct Stats {
    pub entries: Vec<EntryPoint>,
    pub modules: Vec<Module>,
    pub chunks: Vec<Chunk>,

    /// Bundle text keyed by output file name
    pub assets: IndexMap<String, String>,

    /// File names written under the output directory
    pub files: Vec<String>,
}

impl Stats {
    /// JSON snapshot for tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The main compiler
pub struct Compiler {
    /// Project configuration
    config: Arc<Config>,

    /// Module resolver
    resolver: Resolver,

    /// Loader pipeline
    loaders: LoaderPipeline,

    /// Lifecycle hooks
    hooks: HookDispatcher,

    /// Module graph, shared across all entries of this run
    graph: Arc<RwLock<ModuleGraph>>,

    /// Context root all module ids are relative to
    root: PathBuf,
}

impl Compiler {
    /// Create a compiler from a configuration.
    pub fn new(config: Config) -> Result<Self> {
        if config.output.filename.trim().is_empty() {
            return Err(Error::config("output.filename must not be empty"));
        }
        if config.output.path.trim().is_empty() {
            return Err(Error::config("output.path must not be empty"));
        }

        let root = config.context_dir();
        let resolver = Resolver::new(&config.resolve.extensions);
        let loaders = LoaderPipeline::from_config(&config.module.rules)?;

        Ok(Self {
            config: Arc::new(config),
            resolver,
            loaders,
            hooks: HookDispatcher::new(),
            graph: Arc::new(RwLock::new(ModuleGraph::new())),
            root,
        })
    }

    /// Create a compiler and register `plugins`, each applied exactly once
    /// before anything else happens.
    pub fn with_plugins(config: Config, plugins: &[&dyn Plugin]) -> Result<Self> {
        let mut compiler = Self::new(config)?;
        for plugin in plugins {
            compiler.apply_plugin(*plugin);
        }
        Ok(compiler)
    }

    /// Register a plugin; its `apply` runs once, immediately.
    pub fn apply_plugin(&mut self, plugin: &dyn Plugin) {
        debug!("applying plugin '{}'", plugin.name());
        plugin.apply(&mut self.hooks);
    }

    /// Subscribe hook observers directly, without a plugin object.
    pub fn hooks_mut(&mut self) -> &mut HookDispatcher {
        &mut self.hooks
    }

    /// Register an extra loader rule with custom transforms.
    pub fn add_loader_rule(&mut self, pattern: &str, loaders: Vec<LoaderFn>) -> Result<()> {
        self.loaders.add_rule(pattern, loaders)
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.config.output.path))
    }

    /// Run the compilation to completion.
    ///
    /// On failure nothing is written and the `Emit`/`Done` hooks do not
    /// fire; re-running after fixing the cause recompiles from scratch.
    pub fn run(&mut self) -> Result<Stats> {
        let start = Instant::now();
        self.hooks.call(HookKind::Run);

        let entries = self.entry_points()?;
        info!("building {} entry point(s)", entries.len());

        let mut chunks = Vec::new();
        for entry in &entries {
            let entry_id = self.build_module(&entry.name, &entry.path)?;
            let graph = self.graph.read();
            chunks.push(chunk::assemble(&entry.name, &entry_id, &graph));
        }

        let mut assets = IndexMap::new();
        {
            let graph = self.graph.read();
            for chunk in &chunks {
                let code = codegen::generate(chunk, &graph);
                let file_name = self.render_filename(&chunk.name, &code);
                assets.insert(file_name, code);
            }
        }

        self.hooks.call(HookKind::Emit);

        let files = self.write_assets(&assets)?;

        self.hooks.call(HookKind::Done);

        debug!("compilation finished in {:?}", start.elapsed());

        let graph = self.graph.read();
        Ok(Stats {
            entries,
            modules: graph.modules().cloned().collect(),
            chunks,
            assets,
            files,
        })
    }

    /// Resolve configured entries to absolute, existing files.
    fn entry_points(&self) -> Result<Vec<EntryPoint>> {
        let mut entries = Vec::new();
        for (name, path) in self.config.entry_points()? {
            if !path.is_file() {
                return Err(Error::config(format!(
                    "entry '{}' points to non-existent file: {}",
                    name,
                    path.display()
                )));
            }
            entries.push(EntryPoint { name, path });
        }
        Ok(entries)
    }

    /// Build one module and, recursively, everything it requires.
    ///
    /// The shared graph guarantees at most one build per module: a
    /// placeholder is registered before any work happens, inside a single
    /// write-lock scope, so re-entrant discovery through cycles or shared
    /// modules reuses the existing record and only gains an owner.
    fn build_module(&self, entry_name: &str, path: &Path) -> Result<String> {
        let path = normalize_path(path);
        let id = module_id(&self.root, &path);

        {
            let mut graph = self.graph.write();
            if !graph.begin(&id, entry_name) {
                return Ok(id);
            }
        }

        debug!("building module '{}'", id);

        let raw_source = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let loaded = self.loaders.apply(&raw_source, &path)?;
        let analysis = analyzer::analyze(&loaded, &path)?;

        let from_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut call_site_ids = Vec::new();
        let mut dependencies = IndexSet::new();
        for specifier in analysis.specifiers() {
            let dep_path = self.resolver.resolve(specifier, from_dir)?;
            let dep_id = self.build_module(entry_name, &dep_path)?;
            dependencies.insert(dep_id.clone());
            call_site_ids.push(dep_id);
        }

        let generated_source = analysis.bind(&call_site_ids);

        let module = Module {
            id: id.clone(),
            path,
            raw_source,
            generated_source,
            dependencies,
            // placeholder owners carry over in finish()
            owners: IndexSet::new(),
        };

        self.graph.write().finish(module);
        Ok(id)
    }

    /// Substitute filename template tokens for one chunk.
    fn render_filename(&self, entry_name: &str, code: &str) -> String {
        let mut name = self.config.output.filename.replace("[name]", entry_name);
        if name.contains("[contenthash]") {
            name = name.replace("[contenthash]", &hash_content(code.as_bytes()));
        }
        name
    }

    /// Persist assets under the output directory.
    fn write_assets(&self, assets: &IndexMap<String, String>) -> Result<Vec<String>> {
        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir).map_err(|e| Error::io(&output_dir, e))?;

        let mut files = Vec::new();
        for (file_name, code) in assets {
            let target = output_dir.join(file_name);
            fs::write(&target, code).map_err(|e| Error::io(&target, e))?;
            info!("wrote {} ({} bytes)", target.display(), code.len());
            files.push(file_name.clone());
        }
        Ok(files)
    }
}

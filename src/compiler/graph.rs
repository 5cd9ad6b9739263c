//! Module graph data structures
//!
//! The graph is the single source of truth for one compilation: exactly one
//! record per distinct source file, keyed by canonical module id, kept in
//! discovery order. A module is tracked from the moment it is first seen,
//! so cyclic imports and shared modules never trigger duplicate work.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// A fully built module. Immutable once it lands in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    /// Canonical root-relative id, e.g. `./src/entry.js`
    pub id: String,

    /// Absolute path on disk
    pub path: PathBuf,

    /// Source as read from disk, before loaders
    pub raw_source: String,

    /// Source after loaders and dependency rewriting
    pub generated_source: String,

    /// Ids of the modules this module requires
    pub dependencies: IndexSet<String>,

    /// Entry names that can reach this module
    pub owners: IndexSet<String>,
}

/// Build state of a tracked module.
#[derive(Debug)]
pub enum ModuleState {
    /// Discovered and currently being built; owners recorded so far.
    InProgress { owners: IndexSet<String> },

    /// Finished.
    Done(Module),
}

impl ModuleState {
    fn owners_mut(&mut self) -> &mut IndexSet<String> {
        match self {
            ModuleState::InProgress { owners } => owners,
            ModuleState::Done(module) => &mut module.owners,
        }
    }
}

/// All modules of one compilation, in discovery order.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    states: IndexMap<String, ModuleState>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the module is already tracked, in progress or done.
    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    /// Start building a module by inserting its in-progress placeholder.
    ///
    /// Returns false when the module is already tracked. In that case the
    /// entry is recorded as an additional owner of the module and, if the
    /// module is already built, of everything reachable from it, keeping
    /// every chunk self-contained.
    pub fn begin(&mut self, id: &str, entry: &str) -> bool {
        if self.states.contains_key(id) {
            self.adopt(id, entry);
            return false;
        }
        let mut owners = IndexSet::new();
        owners.insert(entry.to_string());
        self.states
            .insert(id.to_string(), ModuleState::InProgress { owners });
        true
    }

    /// Mark `entry` as an owner of `id` and of its dependency closure.
    fn adopt(&mut self, id: &str, entry: &str) {
        let mut queue = vec![id.to_string()];
        while let Some(current) = queue.pop() {
            let Some(state) = self.states.get_mut(&current) else {
                continue;
            };
            if !state.owners_mut().insert(entry.to_string()) {
                continue;
            }
            if let ModuleState::Done(module) = state {
                queue.extend(module.dependencies.iter().cloned());
            }
        }
    }

    /// Finalize a module. Owners accumulated on the placeholder carry over.
    pub fn finish(&mut self, mut module: Module) {
        if let Some(ModuleState::InProgress { owners }) = self.states.get_mut(&module.id) {
            module.owners = std::mem::take(owners);
        }
        self.states
            .insert(module.id.clone(), ModuleState::Done(module));
    }

    /// Look up a finished module.
    pub fn get(&self, id: &str) -> Option<&Module> {
        match self.states.get(id) {
            Some(ModuleState::Done(module)) => Some(module),
            _ => None,
        }
    }

    /// Finished modules in discovery order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.states.values().filter_map(|state| match state {
            ModuleState::Done(module) => Some(module),
            ModuleState::InProgress { .. } => None,
        })
    }

    /// Finished modules owned by `entry`, in discovery order.
    pub fn modules_for_entry<'a>(&'a self, entry: &'a str) -> impl Iterator<Item = &'a Module> {
        self.modules().filter(move |module| module.owners.contains(entry))
    }

    /// Total number of tracked modules.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, dependencies: &[&str]) -> Module {
        Module {
            id: id.to_string(),
            path: PathBuf::from(format!("/project/{}", id.trim_start_matches("./"))),
            raw_source: String::new(),
            generated_source: String::new(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            owners: IndexSet::new(),
        }
    }

    #[test]
    fn test_begin_dedups() {
        let mut graph = ModuleGraph::new();
        assert!(graph.begin("./a.js", "main"));
        assert!(!graph.begin("./a.js", "main"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_finish_keeps_placeholder_owners() {
        let mut graph = ModuleGraph::new();
        graph.begin("./a.js", "main");
        graph.begin("./a.js", "other");
        graph.finish(module("./a.js", &[]));

        let owners: Vec<&str> = graph.get("./a.js").unwrap().owners.iter().map(String::as_str).collect();
        assert_eq!(owners, ["main", "other"]);
    }

    #[test]
    fn test_adopt_walks_dependency_closure() {
        let mut graph = ModuleGraph::new();
        graph.begin("./a.js", "one");
        graph.finish(module("./a.js", &["./b.js"]));
        graph.begin("./b.js", "one");
        graph.finish(module("./b.js", &["./c.js"]));
        graph.begin("./c.js", "one");
        graph.finish(module("./c.js", &[]));

        // second entry reaches a, which must pull b and c along
        graph.begin("./a.js", "two");

        for id in ["./a.js", "./b.js", "./c.js"] {
            assert!(graph.get(id).unwrap().owners.contains("two"), "{id} not adopted");
        }
    }

    #[test]
    fn test_adopt_terminates_on_cycles() {
        let mut graph = ModuleGraph::new();
        graph.begin("./a.js", "one");
        graph.finish(module("./a.js", &["./b.js"]));
        graph.begin("./b.js", "one");
        graph.finish(module("./b.js", &["./a.js"]));

        graph.begin("./a.js", "two");

        assert!(graph.get("./a.js").unwrap().owners.contains("two"));
        assert!(graph.get("./b.js").unwrap().owners.contains("two"));
    }

    #[test]
    fn test_modules_keep_discovery_order() {
        let mut graph = ModuleGraph::new();
        for id in ["./entry.js", "./a.js", "./b.js"] {
            graph.begin(id, "main");
            graph.finish(module(id, &[]));
        }

        let ids: Vec<&str> = graph.modules().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["./entry.js", "./a.js", "./b.js"]);
    }

    #[test]
    fn test_modules_for_entry_filters_by_owner() {
        let mut graph = ModuleGraph::new();
        graph.begin("./a.js", "one");
        graph.finish(module("./a.js", &[]));
        graph.begin("./b.js", "two");
        graph.finish(module("./b.js", &[]));

        let ids: Vec<&str> = graph.modules_for_entry("one").map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["./a.js"]);
    }
}

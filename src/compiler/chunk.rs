//! Chunk assembly
//!
//! A chunk is the set of modules reachable from one entry, destined for
//! one output bundle.

use serde::Serialize;

use super::graph::ModuleGraph;

/// A group of modules bundled together for one entry.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// Entry name; feeds the `[name]` filename token
    pub name: String,

    /// Id of the module the runtime boots with
    pub entry_module_id: String,

    /// Member module ids: entry first, then discovery order
    pub module_ids: Vec<String>,
}

impl Chunk {
    /// Number of modules in the chunk.
    pub fn len(&self) -> usize {
        self.module_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.module_ids.is_empty()
    }
}

/// Collect every module owned by `entry_name` into a chunk.
pub fn assemble(entry_name: &str, entry_module_id: &str, graph: &ModuleGraph) -> Chunk {
    let mut module_ids = vec![entry_module_id.to_string()];
    for module in graph.modules_for_entry(entry_name) {
        if module.id != entry_module_id {
            module_ids.push(module.id.clone());
        }
    }

    Chunk {
        name: entry_name.to_string(),
        entry_module_id: entry_module_id.to_string(),
        module_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::super::graph::Module;
    use super::*;
    use indexmap::IndexSet;
    use std::path::PathBuf;

    fn finished(graph: &mut ModuleGraph, id: &str, entry: &str) {
        graph.begin(id, entry);
        graph.finish(Module {
            id: id.to_string(),
            path: PathBuf::from("/p").join(id.trim_start_matches("./")),
            raw_source: String::new(),
            generated_source: String::new(),
            dependencies: IndexSet::new(),
            owners: IndexSet::new(),
        });
    }

    #[test]
    fn test_entry_module_comes_first() {
        let mut graph = ModuleGraph::new();
        finished(&mut graph, "./shared.js", "app");
        finished(&mut graph, "./entry.js", "app");

        let chunk = assemble("app", "./entry.js", &graph);
        assert_eq!(chunk.module_ids, ["./entry.js", "./shared.js"]);
    }

    #[test]
    fn test_only_owned_modules_are_members() {
        let mut graph = ModuleGraph::new();
        finished(&mut graph, "./entry.js", "app");
        finished(&mut graph, "./other.js", "admin");

        let chunk = assemble("app", "./entry.js", &graph);
        assert_eq!(chunk.module_ids, ["./entry.js"]);
        assert_eq!(chunk.len(), 1);
    }
}

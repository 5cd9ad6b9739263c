//! Bundle code generation
//!
//! Serializes a chunk into one self-executing script: a module registry,
//! a small module cache plus loader function, and a bootstrap call for the
//! entry module. The emitted text is self-contained; every dependency call
//! has already been rewritten to the runtime loader symbol.

use std::fmt::Write;

use super::chunk::Chunk;
use super::graph::ModuleGraph;
use crate::utils::escape_js_string;

/// Loader symbol rewritten call sites target.
pub const RUNTIME_REQUIRE: &str = "__packlet_require__";

const RUNTIME_MODULES: &str = "__packlet_modules__";
const RUNTIME_CACHE: &str = "__packlet_module_cache__";

/// Emit the bundle text for one chunk.
pub fn generate(chunk: &Chunk, graph: &ModuleGraph) -> String {
    let mut out = String::new();
    out.push_str("(() => {\n\"use strict\";\n");

    let _ = writeln!(out, "var {RUNTIME_MODULES} = ({{");
    for id in &chunk.module_ids {
        if let Some(module) = graph.get(id) {
            let _ = writeln!(
                out,
                "\"{}\": ((module, exports, {RUNTIME_REQUIRE}) => {{\n{}\n}}),",
                escape_js_string(&module.id),
                module.generated_source,
            );
        }
    }
    out.push_str("});\n");

    out.push_str(&runtime());

    let _ = writeln!(
        out,
        "{RUNTIME_REQUIRE}(\"{}\");",
        escape_js_string(&chunk.entry_module_id)
    );
    out.push_str("})();\n");
    out
}

/// The fixed module cache and loader embedded in every bundle.
///
/// The cache entry is registered before the factory runs, so a re-entrant
/// load during a cyclic import sees the partially filled exports object
/// instead of recursing forever.
fn runtime() -> String {
    format!(
        r#"var {RUNTIME_CACHE} = {{}};
function {RUNTIME_REQUIRE}(moduleId) {{
  var cachedModule = {RUNTIME_CACHE}[moduleId];
  if (cachedModule !== undefined) {{
    return cachedModule.exports;
  }}
  var module = ({RUNTIME_CACHE}[moduleId] = {{ exports: {{}} }});
  {RUNTIME_MODULES}[moduleId](module, module.exports, {RUNTIME_REQUIRE});
  return module.exports;
}}
"#
    )
}

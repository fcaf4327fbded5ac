//! Self-invoking bundle generation.
//!
//! Every compile task becomes one script: the entry module and everything
//! it imports, wrapped in a module registry inside a single function
//! expression. Imports of external modules are left as `require(...)`
//! calls for the page to satisfy.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use docgen_examples::{CompileTask, ExampleBatch};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::BundleError;
use crate::module::{Dependency, ImportClause, ParsedModule, parse_module};
use crate::resolve::{ModuleId, Resolver, Target};

/// Compile-time constant consumed by examples to select the icon library.
pub const ICON_LIB_DEFINE: &str = "process.env.DOCS_ICON_LIB";

const PRELUDE: &str = r#"(function () {
  "use strict";
  var __modules = {};
  var __cache = {};
  function __require(id) {
    var cached = __cache[id];
    if (cached) return cached.exports;
    var module = (__cache[id] = { exports: {} });
    __modules[id](module, module.exports);
    return module.exports;
  }
  function __importDefault(mod) {
    return mod && mod.__esModule ? mod.default : mod;
  }
  function __export(target, getters) {
    for (var name in getters)
      Object.defineProperty(target, name, { get: getters[name], enumerable: true });
  }
  function __exportStar(target, source) {
    Object.keys(source).forEach(function (name) {
      if (name === "default" || Object.prototype.hasOwnProperty.call(target, name)) return;
      Object.defineProperty(target, name, {
        get: function () {
          return source[name];
        },
        enumerable: true,
      });
    });
  }
"#;

const EPILOGUE: &str = "  __require(0);\n})();\n";

/// One bundled script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleOutput {
    /// Destination file.
    pub path: PathBuf,
    pub contents: String,
}

/// Turns a batch of compile tasks into scripts.
pub trait Bundler: Send + Sync {
    /// Bundle every task. Fails as a whole if any task fails.
    fn bundle(&self, batch: &ExampleBatch) -> Result<Vec<BundleOutput>, BundleError>;
}

/// Bundler producing immediately invoked function expressions for browsers.
#[derive(Clone, Debug)]
pub struct IifeBundler {
    root: PathBuf,
    defines: BTreeMap<String, String>,
}

impl IifeBundler {
    /// Create a bundler. Virtual task sources live directly under `root`
    /// and relative imports from them resolve against it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            defines: BTreeMap::new(),
        }
    }

    /// Replace every occurrence of the dotted identifier `key` with the
    /// JavaScript expression `value`.
    #[must_use]
    pub fn with_define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(key.into(), value.into());
        self
    }

    /// Define [`ICON_LIB_DEFINE`] as a string literal naming `icon_lib`.
    #[must_use]
    pub fn with_icon_lib(self, icon_lib: &str) -> Self {
        let literal = serde_json::Value::String(icon_lib.to_owned()).to_string();
        self.with_define(ICON_LIB_DEFINE, literal)
    }

    fn bundle_task(
        &self,
        resolver: &Resolver<'_>,
        output_folder: &Path,
        task: &CompileTask,
    ) -> Result<BundleOutput, BundleError> {
        let entry = resolver
            .virtual_id(&task.source_file)
            .ok_or_else(|| BundleError::Unresolved {
                entry: task.source_file.clone(),
                importer: "<batch>".to_owned(),
                specifier: task.source_file.clone(),
            })?;

        let mut graph = Graph::default();
        graph.insert(entry);

        let mut contents = String::from(PRELUDE);
        let mut next = 0;
        while next < graph.modules.len() {
            let id = graph.modules[next].clone();
            let module = self.load(resolver, &id)?;
            let mut requires = Vec::with_capacity(module.dependencies.len());
            for dependency in &module.dependencies {
                let target = resolver.resolve(dependency.specifier(), &id).ok_or_else(|| {
                    BundleError::Unresolved {
                        entry: task.source_file.clone(),
                        importer: id.to_string(),
                        specifier: dependency.specifier().to_owned(),
                    }
                })?;
                requires.push(match target {
                    Target::External(name) => {
                        format!("require({})", serde_json::Value::String(name))
                    }
                    Target::Module(dep) => format!("__require({})", graph.insert(dep)),
                });
            }
            emit_module(&mut contents, next, &module, &requires);
            next += 1;
        }
        contents.push_str(EPILOGUE);

        let stem = task
            .output_file
            .strip_suffix(".js")
            .unwrap_or(&task.output_file);
        let path = output_folder.join(format!("{stem}.js"));
        debug!(
            path = %path.display(),
            modules = graph.modules.len(),
            bytes = contents.len(),
            "Bundled example"
        );
        Ok(BundleOutput { path, contents })
    }

    fn load(&self, resolver: &Resolver<'_>, id: &ModuleId) -> Result<ParsedModule, BundleError> {
        let source = match id {
            ModuleId::Virtual(name) => resolver
                .virtual_source(name)
                .map(ToOwned::to_owned)
                .unwrap_or_default(),
            ModuleId::File(path) => {
                let source =
                    std::fs::read_to_string(path).map_err(|source| BundleError::Read {
                        path: path.clone(),
                        source,
                    })?;
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("js" | "mjs" | "cjs") => source,
                    Some("json") => {
                        let value: serde_json::Value = serde_json::from_str(&source)?;
                        return Ok(ParsedModule {
                            dependencies: Vec::new(),
                            exports: Vec::new(),
                            body: format!("module.exports = {value};\n"),
                        });
                    }
                    _ => return Err(BundleError::Unsupported { path: path.clone() }),
                }
            }
        };
        Ok(parse_module(&self.apply_defines(&source)))
    }

    fn apply_defines(&self, source: &str) -> String {
        self.defines
            .iter()
            .fold(source.to_owned(), |code, (key, value)| {
                replace_identifier(&code, key, value)
            })
    }
}

impl Bundler for IifeBundler {
    fn bundle(&self, batch: &ExampleBatch) -> Result<Vec<BundleOutput>, BundleError> {
        let resolver = Resolver::new(
            &self.root,
            batch
                .tasks
                .iter()
                .map(|task| (task.source_file.as_str(), task.sourcecode.as_str())),
            &batch.external,
        );

        let outputs = batch
            .tasks
            .par_iter()
            .map(|task| self.bundle_task(&resolver, &batch.output_folder, task))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = outputs.len(), "Bundled examples");
        Ok(outputs)
    }
}

/// Modules reachable from one entry, in discovery order.
#[derive(Default)]
struct Graph {
    modules: Vec<ModuleId>,
    index: HashMap<ModuleId, usize>,
}

impl Graph {
    fn insert(&mut self, id: ModuleId) -> usize {
        if let Some(&existing) = self.index.get(&id) {
            return existing;
        }
        let index = self.modules.len();
        self.index.insert(id.clone(), index);
        self.modules.push(id);
        index
    }
}

fn emit_module(out: &mut String, index: usize, module: &ParsedModule, requires: &[String]) {
    let is_esm = !module.dependencies.is_empty() || !module.exports.is_empty();

    let mut getters: Vec<(String, String)> = module
        .exports
        .iter()
        .map(|(exported, local)| (exported.clone(), local.clone()))
        .collect();
    let mut prologue = String::new();
    let mut stars = Vec::new();

    for (k, (dependency, require)) in module.dependencies.iter().zip(requires).enumerate() {
        let dep = format!("__dep{k}");
        writeln!(prologue, "    const {dep} = {require};").unwrap();
        match dependency {
            Dependency::Import { clauses, .. } => {
                for clause in clauses {
                    match clause {
                        ImportClause::Default(local) => {
                            writeln!(prologue, "    const {local} = __importDefault({dep});")
                                .unwrap();
                        }
                        ImportClause::Namespace(local) => {
                            writeln!(prologue, "    const {local} = {dep};").unwrap();
                        }
                        ImportClause::Named(names) => {
                            let bindings = names
                                .iter()
                                .map(|(imported, local)| {
                                    if imported == local {
                                        local.clone()
                                    } else {
                                        format!("{imported}: {local}")
                                    }
                                })
                                .collect::<Vec<_>>()
                                .join(", ");
                            writeln!(prologue, "    const {{ {bindings} }} = {dep};").unwrap();
                        }
                    }
                }
            }
            Dependency::ReExport { names, .. } => {
                getters.extend(
                    names
                        .iter()
                        .map(|(imported, exported)| (exported.clone(), format!("{dep}.{imported}"))),
                );
            }
            Dependency::ReExportAll {
                namespace: Some(namespace),
                ..
            } => getters.push((namespace.clone(), dep)),
            Dependency::ReExportAll { namespace: None, .. } => stars.push(dep),
        }
    }

    writeln!(out, "  __modules[{index}] = function (module, exports) {{").unwrap();
    if is_esm {
        out.push_str("    Object.defineProperty(exports, \"__esModule\", { value: true });\n");
    }
    out.push_str(&prologue);
    if !getters.is_empty() {
        let list = getters
            .iter()
            .map(|(name, expr)| format!("{}: () => {expr}", property_key(name)))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "    __export(exports, {{ {list} }});").unwrap();
    }
    for star in stars {
        writeln!(out, "    __exportStar(exports, {star});").unwrap();
    }
    for line in module.body.trim_end().lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            writeln!(out, "    {line}").unwrap();
        }
    }
    out.push_str("  };\n");
}

fn property_key(name: &str) -> String {
    if name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        name.to_owned()
    } else {
        serde_json::Value::String(name.to_owned()).to_string()
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace whole occurrences of a dotted identifier.
///
/// `process.env.X` matches in `a(process.env.X)` but not in
/// `process.env.XY` or `my.process.env.X`.
fn replace_identifier(code: &str, key: &str, value: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for (start, _) in code.match_indices(key) {
        if start < cursor {
            continue;
        }
        let end = start + key.len();
        let before = code[..start].chars().next_back();
        let after = code[end..].chars().next();
        let bounded = !before.is_some_and(|c| is_identifier_char(c) || c == '.')
            && !after.is_some_and(is_identifier_char);
        if bounded {
            out.push_str(&code[cursor..start]);
            out.push_str(value);
            cursor = end;
        }
    }
    out.push_str(&code[cursor..]);
    out
}

/// Write bundles to disk, creating parent folders.
pub fn write_bundles(outputs: &[BundleOutput]) -> Result<(), BundleError> {
    for output in outputs {
        if let Some(parent) = output.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BundleError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&output.path, &output.contents).map_err(|source| BundleError::Write {
            path: output.path.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn task(source_file: &str, output_file: &str, sourcecode: &str) -> CompileTask {
        CompileTask {
            source_file: source_file.to_owned(),
            output_file: output_file.to_owned(),
            sourcecode: sourcecode.to_owned(),
            parent: "guide/index.md".to_owned(),
        }
    }

    fn batch(root: &Path, tasks: Vec<CompileTask>) -> ExampleBatch {
        ExampleBatch {
            output_folder: root.join("out"),
            external: vec!["vue".to_owned()],
            tasks,
        }
    }

    #[test]
    fn test_bundle_wraps_entry_in_iife() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = IifeBundler::new(dir.path());
        let batch = batch(
            dir.path(),
            vec![task(
                "button-abc.js",
                "example-abc.js",
                "import { createApp } from \"vue\";\ncreateApp({}).mount(\"#example-abc\");\n",
            )],
        );

        let outputs = bundler.bundle(&batch).unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].path, dir.path().join("out/example-abc.js"));
        let js = &outputs[0].contents;
        assert!(js.starts_with("(function () {"));
        assert!(js.ends_with("__require(0);\n})();\n"));
        assert!(js.contains("const __dep0 = require(\"vue\");"));
        assert!(js.contains("const { createApp } = __dep0;"));
        assert!(js.contains("    createApp({}).mount(\"#example-abc\");\n"));
        assert!(!js.contains("import "));
    }

    #[test]
    fn test_bundle_inlines_local_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/src")).unwrap();
        std::fs::write(
            dir.path().join("docs/src/setup.js"),
            "import config from \"./config.json\";\nexport function setup(options) {\n  return config.name;\n}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("docs/src/config.json"), "{\"name\": \"demo\"}").unwrap();

        let bundler = IifeBundler::new(dir.path());
        let batch = batch(
            dir.path(),
            vec![task(
                "card-123.js",
                "example-123.js",
                "import { setup } from \"./docs/src/setup\";\nsetup({});\n",
            )],
        );

        let js = bundler.bundle(&batch).unwrap().remove(0).contents;

        assert!(js.contains("const __dep0 = __require(1);"));
        assert!(js.contains("__export(exports, { setup: () => setup });"));
        assert!(js.contains("const config = __importDefault(__dep0);"));
        assert!(js.contains("__modules[2] = function (module, exports) {\n    module.exports = {\"name\":\"demo\"};\n"));
    }

    #[test]
    fn test_same_source_distinct_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = IifeBundler::new(dir.path());
        let code = "console.log(1);\n";
        let batch = batch(
            dir.path(),
            vec![
                task("a-1.js", "example-1.js", code),
                task("b-2.js", "example-2.js", code),
            ],
        );

        let outputs = bundler.bundle(&batch).unwrap();
        let paths: Vec<_> = outputs.iter().map(|o| o.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("out/example-1.js"),
                dir.path().join("out/example-2.js")
            ]
        );
    }

    #[test]
    fn test_unresolved_import_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = IifeBundler::new(dir.path());
        let batch = batch(
            dir.path(),
            vec![
                task("ok-1.js", "example-1.js", "console.log(1);\n"),
                task("bad-2.js", "example-2.js", "import x from \"lodash\";\n"),
            ],
        );

        let err = bundler.bundle(&batch).unwrap_err();
        assert!(matches!(
            err,
            BundleError::Unresolved { ref specifier, .. } if specifier == "lodash"
        ));
        assert!(err.to_string().contains("bad-2.js"));
    }

    #[test]
    fn test_icon_lib_define() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = IifeBundler::new(dir.path()).with_icon_lib("@fkui/icon-lib-default");
        let batch = batch(
            dir.path(),
            vec![task(
                "icons-1.js",
                "example-1.js",
                "const lib = process.env.DOCS_ICON_LIB;\nconst other = process.env.DOCS_ICON_LIBRARY;\n",
            )],
        );

        let js = bundler.bundle(&batch).unwrap().remove(0).contents;
        assert!(js.contains("const lib = \"@fkui/icon-lib-default\";"));
        assert!(js.contains("const other = process.env.DOCS_ICON_LIBRARY;"));
    }

    #[test]
    fn test_reexports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.js"), "export const a = 1;\n").unwrap();
        let bundler = IifeBundler::new(dir.path());
        let batch = batch(
            dir.path(),
            vec![task(
                "entry-1.js",
                "example-1.js",
                "export { a as b } from \"./lib.js\";\nexport * from \"./lib.js\";\n",
            )],
        );

        let js = bundler.bundle(&batch).unwrap().remove(0).contents;
        assert!(js.contains("__export(exports, { b: () => __dep0.a });"));
        assert!(js.contains("__exportStar(exports, __dep1);"));
        assert!(js.contains("__modules[1] = function"));
        assert!(!js.contains("__modules[2]"));
    }

    #[test]
    fn test_write_bundles_creates_folders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/example-1.js");
        write_bundles(&[BundleOutput {
            path: path.clone(),
            contents: "x".to_owned(),
        }])
        .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x");
    }

    #[test]
    fn test_replace_identifier_boundaries() {
        assert_eq!(
            replace_identifier("f(process.env.X, my.process.env.X)", "process.env.X", "1"),
            "f(1, my.process.env.X)"
        );
    }
}

//! ES module syntax extraction.
//!
//! Finds top-level `import` and `export` statements with line-anchored
//! patterns and strips them from the module body. The bundler turns the
//! collected declarations back into registry lookups and export getters.
//!
//! Only the static subset used by generated examples and their local
//! imports is recognised: default, named and namespace imports, side
//! effect imports, `export default`, exported declarations, export lists
//! and re-exports.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import\s+(?P<clause>[\w$]+\s*,\s*\{[^}]*\}|[\w$]+\s*,\s*\*\s*as\s+[\w$]+|\*\s*as\s+[\w$]+|\{[^}]*\}|[\w$]+)\s*from\s*["'](?P<spec>[^"']+)["'][ \t]*;?"#,
    )
    .unwrap()
});

static IMPORT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s*["'](?P<spec>[^"']+)["'][ \t]*;?"#).unwrap()
});

static EXPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*export\s*(?P<clause>\*\s*as\s+[\w$]+|\*|\{[^}]*\})\s*from\s*["'](?P<spec>[^"']+)["'][ \t]*;?"#,
    )
    .unwrap()
});

static EXPORT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*export\s*\{(?P<list>[^}]*)\}[ \t]*;?").unwrap());

static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?P<indent>[ \t]*)export\s+default\s+").unwrap());

static EXPORT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<indent>[ \t]*)export\s+(?P<decl>(?:async\s+)?function\s*\*?|class|const|let|var)\s+(?P<name>[\w$]+)",
    )
    .unwrap()
});

/// Local name bound to the default export.
pub(crate) const DEFAULT_BINDING: &str = "__default";

/// Bindings introduced by one import declaration.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ImportClause {
    Default(String),
    Namespace(String),
    /// `(imported, local)` pairs.
    Named(Vec<(String, String)>),
}

/// Dependency edge of a module, in source order.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Dependency {
    Import {
        specifier: String,
        clauses: Vec<ImportClause>,
    },
    /// `export { a as b } from` (`(imported, exported)` pairs).
    ReExport {
        specifier: String,
        names: Vec<(String, String)>,
    },
    /// `export * from` or `export * as ns from`.
    ReExportAll {
        specifier: String,
        namespace: Option<String>,
    },
}

impl Dependency {
    pub(crate) fn specifier(&self) -> &str {
        match self {
            Self::Import { specifier, .. }
            | Self::ReExport { specifier, .. }
            | Self::ReExportAll { specifier, .. } => specifier,
        }
    }
}

/// Module with its import/export statements removed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ParsedModule {
    pub dependencies: Vec<Dependency>,
    /// `(exported, local)` pairs for local exports.
    pub exports: Vec<(String, String)>,
    pub body: String,
}

struct Edit {
    range: Range<usize>,
    replacement: String,
}

/// Extract import and export statements from module source.
pub(crate) fn parse_module(source: &str) -> ParsedModule {
    let mut found: Vec<(Edit, Option<Dependency>, Vec<(String, String)>)> = Vec::new();

    for caps in IMPORT_FROM.captures_iter(source) {
        let dependency = Dependency::Import {
            specifier: caps["spec"].to_owned(),
            clauses: parse_import_clause(&caps["clause"]),
        };
        found.push((removal(&caps), Some(dependency), Vec::new()));
    }
    for caps in IMPORT_BARE.captures_iter(source) {
        let dependency = Dependency::Import {
            specifier: caps["spec"].to_owned(),
            clauses: Vec::new(),
        };
        found.push((removal(&caps), Some(dependency), Vec::new()));
    }
    for caps in EXPORT_FROM.captures_iter(source) {
        let specifier = caps["spec"].to_owned();
        let clause = caps["clause"].trim();
        let dependency = if let Some(list) = clause.strip_prefix('{') {
            Dependency::ReExport {
                specifier,
                names: parse_name_list(list.trim_end_matches('}')),
            }
        } else {
            Dependency::ReExportAll {
                specifier,
                namespace: clause
                    .strip_prefix('*')
                    .and_then(|rest| rest.trim().strip_prefix("as"))
                    .map(|name| name.trim().to_owned()),
            }
        };
        found.push((removal(&caps), Some(dependency), Vec::new()));
    }
    for caps in EXPORT_LIST.captures_iter(source) {
        let exports = parse_name_list(&caps["list"])
            .into_iter()
            .map(|(local, exported)| (exported, local))
            .collect();
        found.push((removal(&caps), None, exports));
    }
    for caps in EXPORT_DEFAULT.captures_iter(source) {
        let edit = Edit {
            range: whole(&caps),
            replacement: format!("{}const {DEFAULT_BINDING} = ", &caps["indent"]),
        };
        found.push((
            edit,
            None,
            vec![("default".to_owned(), DEFAULT_BINDING.to_owned())],
        ));
    }
    for caps in EXPORT_DECL.captures_iter(source) {
        let name = caps["name"].to_owned();
        let edit = Edit {
            range: whole(&caps),
            replacement: format!("{}{} {name}", &caps["indent"], &caps["decl"]),
        };
        found.push((edit, None, vec![(name.clone(), name)]));
    }

    found.sort_by_key(|(edit, _, _)| edit.range.start);

    let mut body = String::with_capacity(source.len());
    let mut dependencies = Vec::new();
    let mut exports = Vec::new();
    let mut cursor = 0;
    for (edit, dependency, exported) in found {
        // Patterns can overlap (e.g. `export {} from` also looks like a list).
        if edit.range.start < cursor {
            continue;
        }
        body.push_str(&source[cursor..edit.range.start]);
        body.push_str(&edit.replacement);
        cursor = edit.range.end;
        dependencies.extend(dependency);
        exports.extend(exported);
    }
    body.push_str(&source[cursor..]);

    ParsedModule {
        dependencies,
        exports,
        body,
    }
}

fn whole(caps: &Captures<'_>) -> Range<usize> {
    caps.get(0).map_or(0..0, |m| m.range())
}

fn removal(caps: &Captures<'_>) -> Edit {
    Edit {
        range: whole(caps),
        replacement: String::new(),
    }
}

fn parse_import_clause(clause: &str) -> Vec<ImportClause> {
    let mut clauses = Vec::new();
    let mut rest = clause.trim();

    if !rest.starts_with('{') && !rest.starts_with('*') {
        let (default, remainder) = rest.split_once(',').unwrap_or((rest, ""));
        clauses.push(ImportClause::Default(default.trim().to_owned()));
        rest = remainder.trim();
    }

    if let Some(list) = rest.strip_prefix('{') {
        clauses.push(ImportClause::Named(parse_name_list(
            list.trim_end_matches('}'),
        )));
    } else if let Some(namespace) = rest.strip_prefix('*') {
        let name = namespace.trim().trim_start_matches("as").trim();
        clauses.push(ImportClause::Namespace(name.to_owned()));
    }

    clauses
}

/// Parse `a, b as c` into `(a, a), (b, c)`.
fn parse_name_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let mut words = item.split_whitespace();
            let first = words.next().unwrap_or_default().to_owned();
            match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => (first, alias.to_owned()),
                _ => (first.clone(), first),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
            .collect()
    }

    #[test]
    fn test_import_forms() {
        let parsed = parse_module(
            "import Vue from \"vue\";\nimport { a, b as c } from './util.js';\nimport * as ns from \"./ns.js\"\nimport \"./side.js\";\nimport d, { e } from \"./both.js\";\nrun();\n",
        );
        assert_eq!(
            parsed.dependencies,
            vec![
                Dependency::Import {
                    specifier: "vue".to_owned(),
                    clauses: vec![ImportClause::Default("Vue".to_owned())],
                },
                Dependency::Import {
                    specifier: "./util.js".to_owned(),
                    clauses: vec![ImportClause::Named(pairs(&[("a", "a"), ("b", "c")]))],
                },
                Dependency::Import {
                    specifier: "./ns.js".to_owned(),
                    clauses: vec![ImportClause::Namespace("ns".to_owned())],
                },
                Dependency::Import {
                    specifier: "./side.js".to_owned(),
                    clauses: Vec::new(),
                },
                Dependency::Import {
                    specifier: "./both.js".to_owned(),
                    clauses: vec![
                        ImportClause::Default("d".to_owned()),
                        ImportClause::Named(pairs(&[("e", "e")])),
                    ],
                },
            ]
        );
        assert_eq!(parsed.body.trim(), "run();");
    }

    #[test]
    fn test_multiline_named_import() {
        let parsed = parse_module("import {\n    createApp,\n    h,\n} from \"vue\";\ncreateApp();\n");
        assert_eq!(
            parsed.dependencies,
            vec![Dependency::Import {
                specifier: "vue".to_owned(),
                clauses: vec![ImportClause::Named(pairs(&[
                    ("createApp", "createApp"),
                    ("h", "h")
                ]))],
            }]
        );
        assert_eq!(parsed.body, "\ncreateApp();\n");
    }

    #[test]
    fn test_exports() {
        let parsed = parse_module(
            "export const answer = 42;\nexport function greet() {}\nconst x = 1;\nexport { x as y };\nexport default { answer };\n",
        );
        assert_eq!(
            parsed.exports,
            pairs(&[
                ("answer", "answer"),
                ("greet", "greet"),
                ("y", "x"),
                ("default", DEFAULT_BINDING),
            ])
        );
        assert_eq!(
            parsed.body,
            "const answer = 42;\nfunction greet() {}\nconst x = 1;\n\nconst __default = { answer };\n"
        );
    }

    #[test]
    fn test_re_exports() {
        let parsed = parse_module("export * from \"./a.js\";\nexport * as b from \"./b.js\";\nexport { c as d } from \"./c.js\";\n");
        assert_eq!(
            parsed.dependencies,
            vec![
                Dependency::ReExportAll {
                    specifier: "./a.js".to_owned(),
                    namespace: None,
                },
                Dependency::ReExportAll {
                    specifier: "./b.js".to_owned(),
                    namespace: Some("b".to_owned()),
                },
                Dependency::ReExport {
                    specifier: "./c.js".to_owned(),
                    names: pairs(&[("c", "d")]),
                },
            ]
        );
        assert!(parsed.exports.is_empty());
    }

    #[test]
    fn test_async_function_export() {
        let parsed = parse_module("export async function load() {}\n");
        assert_eq!(parsed.body, "async function load() {}\n");
        assert_eq!(parsed.exports, pairs(&[("load", "load")]));
    }

    #[test]
    fn test_plain_script_untouched() {
        let source = "const importantValue = 1;\nconsole.log(importantValue);\n";
        let parsed = parse_module(source);
        assert_eq!(parsed.body, source);
        assert!(parsed.dependencies.is_empty());
    }
}

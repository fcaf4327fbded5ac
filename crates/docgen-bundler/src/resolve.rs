//! Module resolution over virtual sources and the filesystem.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Extensions probed for extensionless relative imports.
const PROBE_EXTENSIONS: &[&str] = &["js", "mjs", "json"];

/// Identity of a bundled module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ModuleId {
    /// In-memory source registered under a root-relative name.
    Virtual(String),
    /// File on disk.
    File(PathBuf),
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual(name) => write!(f, "./{name}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where an import specifier points.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Target {
    /// Provided at runtime, left as `require(...)`.
    External(String),
    Module(ModuleId),
}

/// Resolves import specifiers for one batch.
///
/// Virtual sources behave as if they were files directly under `root`.
/// Relative imports that match a virtual name are served from memory
/// without touching the filesystem.
pub(crate) struct Resolver<'a> {
    root: &'a Path,
    virtual_modules: HashMap<String, &'a str>,
    external: &'a [String],
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        root: &'a Path,
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
        external: &'a [String],
    ) -> Self {
        let virtual_modules = sources
            .into_iter()
            .map(|(name, code)| (virtual_name(name), code))
            .collect();
        Self {
            root,
            virtual_modules,
            external,
        }
    }

    /// Id of the virtual module registered under `name`.
    pub(crate) fn virtual_id(&self, name: &str) -> Option<ModuleId> {
        let name = virtual_name(name);
        self.virtual_modules
            .contains_key(&name)
            .then_some(ModuleId::Virtual(name))
    }

    /// Source of a virtual module.
    pub(crate) fn virtual_source(&self, name: &str) -> Option<&'a str> {
        self.virtual_modules.get(name).copied()
    }

    /// Resolve `specifier` imported from `importer`.
    pub(crate) fn resolve(&self, specifier: &str, importer: &ModuleId) -> Option<Target> {
        if self.is_external(specifier) {
            return Some(Target::External(specifier.to_owned()));
        }

        let candidate = if specifier.starts_with('/') {
            normalize(Path::new(specifier))
        } else if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = match importer {
                ModuleId::Virtual(_) => self.root,
                ModuleId::File(path) => path.parent().unwrap_or(self.root),
            };
            normalize(&base.join(specifier))
        } else {
            return None;
        };

        if let Some(id) = self.match_virtual(&candidate) {
            return Some(Target::Module(id));
        }
        probe(&candidate).map(|path| Target::Module(ModuleId::File(path)))
    }

    fn is_external(&self, specifier: &str) -> bool {
        self.external.iter().any(|ext| {
            specifier == ext
                || specifier
                    .strip_prefix(ext.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn match_virtual(&self, candidate: &Path) -> Option<ModuleId> {
        let relative = candidate.strip_prefix(normalize(self.root)).ok()?;
        let name = relative.to_string_lossy().replace('\\', "/");
        [name.clone(), format!("{name}.js")]
            .into_iter()
            .find(|key| self.virtual_modules.contains_key(key))
            .map(ModuleId::Virtual)
    }
}

/// Canonical virtual name: forward slashes, no leading `./`.
fn virtual_name(name: &str) -> String {
    let name = name.replace('\\', "/");
    name.trim_start_matches("./").to_owned()
}

/// Find an existing file for `candidate`, probing extensions and `index`.
fn probe(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    let with_extension = PROBE_EXTENSIONS.iter().map(|ext| {
        let mut name = candidate.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    });
    let index = PROBE_EXTENSIONS
        .iter()
        .map(|ext| candidate.join(format!("index.{ext}")));
    with_extension.chain(index).find(|path| path.is_file())
}

/// Lexically normalize a path, resolving `.` and `..`.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver<'a>(root: &'a Path, external: &'a [String]) -> Resolver<'a> {
        Resolver::new(
            root,
            [("./button-abc.js", "export default 1;"), ("lib/util.js", "")],
            external,
        )
    }

    #[test]
    fn test_external_and_subpath() {
        let external = vec!["vue".to_owned()];
        let root = Path::new("/site");
        let r = resolver(root, &external);
        let entry = ModuleId::Virtual("button-abc.js".to_owned());
        assert_eq!(
            r.resolve("vue", &entry),
            Some(Target::External("vue".to_owned()))
        );
        assert_eq!(
            r.resolve("vue/dist/vue.esm.js", &entry),
            Some(Target::External("vue/dist/vue.esm.js".to_owned()))
        );
        assert_eq!(r.resolve("vuex", &entry), None);
    }

    #[test]
    fn test_virtual_matches_without_filesystem() {
        let root = Path::new("/site");
        let r = resolver(root, &[]);
        let entry = ModuleId::Virtual("button-abc.js".to_owned());
        assert_eq!(
            r.resolve("./lib/util", &entry),
            Some(Target::Module(ModuleId::Virtual("lib/util.js".to_owned())))
        );
        assert_eq!(r.virtual_id("./button-abc.js"), Some(entry));
        assert_eq!(r.virtual_source("lib/util.js"), Some(""));
    }

    #[test]
    fn test_relative_file_with_probing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/widgets")).unwrap();
        std::fs::write(dir.path().join("src/setup.js"), "").unwrap();
        std::fs::write(dir.path().join("src/widgets/index.js"), "").unwrap();

        let r = resolver(dir.path(), &[]);
        let setup = r
            .resolve("./src/setup", &ModuleId::Virtual("button-abc.js".to_owned()))
            .unwrap();
        assert_eq!(
            setup,
            Target::Module(ModuleId::File(dir.path().join("src/setup.js")))
        );

        let Target::Module(importer) = setup else {
            panic!("expected module");
        };
        assert_eq!(
            r.resolve("./widgets", &importer),
            Some(Target::Module(ModuleId::File(
                dir.path().join("src/widgets/index.js")
            )))
        );
        assert_eq!(r.resolve("./missing", &importer), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }
}

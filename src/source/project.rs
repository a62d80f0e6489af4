use super::expr::Expr;
use super::unit::{ImportKind, SourceUnit};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Extensions tried, in order, when resolving a relative import specifier
const RESOLVE_SUFFIXES: &[&str] = &["", ".ts", ".tsx", "/index.ts", "/index.tsx"];

/// Directories never scanned for sources
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "@generated"];

/// An identifier resolved through an `import` to the unit that declares it
#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// Name under which the identifier is visible in the importing unit
    pub identifier_name: String,
    /// Name of the declaration in `source_unit` (differs when aliased)
    pub declared_name: String,
    /// Unit that declares the imported value
    pub source_unit: Arc<SourceUnit>,
    /// Initializer of the declaration in `source_unit`
    pub initializer: Expr,
}

/// Imported identifiers for one generation pass, scoped per importing unit.
///
/// The same name may be bound differently in two units; each unit sees only
/// its own imports. Within a unit the first binding for a name wins.
#[derive(Debug, Clone, Default)]
pub struct ImportResolutionMap {
    root: String,
    scopes: HashMap<String, HashMap<String, ImportBinding>>,
}

impl ImportResolutionMap {
    /// An empty map whose root scope is the unit at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        ImportResolutionMap {
            root: root.into(),
            scopes: HashMap::new(),
        }
    }

    /// Path of the unit the map was built from
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Insert a binding visible in `unit` unless one already exists for its name.
    ///
    /// Returns `false` when an earlier binding was kept.
    pub fn insert(&mut self, unit: &str, binding: ImportBinding) -> bool {
        let scope = self.scopes.entry(unit.to_string()).or_default();
        if scope.contains_key(&binding.identifier_name) {
            return false;
        }
        scope.insert(binding.identifier_name.clone(), binding);
        true
    }

    /// Binding for `name` as imported by the root unit.
    pub fn get(&self, name: &str) -> Option<&ImportBinding> {
        self.lookup(&self.root, name)
    }

    /// Binding for `name` as imported by `unit`.
    pub fn lookup(&self, unit: &str, name: &str) -> Option<&ImportBinding> {
        self.scopes.get(unit).and_then(|scope| scope.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of bindings across all scopes
    pub fn len(&self) -> usize {
        self.scopes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The set of parsed source units of one application, keyed by normalized path.
#[derive(Debug, Default)]
pub struct Project {
    units: BTreeMap<String, Arc<SourceUnit>>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a project from in-memory `(path, text)` pairs.
    pub fn from_sources<P, T, I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let mut project = Project::new();
        for (path, text) in sources {
            project.add_source(path, text)?;
        }
        Ok(project)
    }

    /// Parse every `.ts` file under `root`.
    ///
    /// Declaration files and `node_modules` are skipped. Unit paths are
    /// relative to `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let mut project = Project::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .map(|name| SKIPPED_DIRS.contains(&name))
                        .unwrap_or(false))
            });
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            let path = entry.path();
            let is_source = path
                .extension()
                .map(|ext| ext == "ts" || ext == "tsx")
                .unwrap_or(false)
                && !path.to_string_lossy().ends_with(".d.ts");
            if !entry.file_type().is_file() || !is_source {
                continue;
            }
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))?;
            let relative = path.strip_prefix(root).unwrap_or(path);
            project.add_source(relative.to_string_lossy(), text)?;
        }
        debug!(root = %root.display(), units = project.units.len(), "Loaded project");
        Ok(project)
    }

    /// Parse and add one source file, replacing any unit with the same path.
    pub fn add_source(&mut self, path: impl Into<String>, text: impl Into<String>) -> Result<Arc<SourceUnit>> {
        let path = normalize_path(&path.into());
        let unit = Arc::new(
            SourceUnit::parse(path.clone(), text)
                .with_context(|| format!("Failed to parse {path}"))?,
        );
        self.units.insert(path, Arc::clone(&unit));
        Ok(unit)
    }

    pub fn unit(&self, path: &str) -> Option<&Arc<SourceUnit>> {
        self.units.get(&normalize_path(path))
    }

    /// Units in path order
    pub fn units(&self) -> impl Iterator<Item = &Arc<SourceUnit>> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Resolve a module specifier written in `from` to a unit of this project.
    ///
    /// Only relative specifiers resolve; package imports such as `zod` are
    /// external to the project.
    pub fn resolve_specifier(&self, from: &SourceUnit, specifier: &str) -> Option<&Arc<SourceUnit>> {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return None;
        }
        let dir = from.path().rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let joined = if dir.is_empty() {
            specifier.to_string()
        } else {
            format!("{dir}/{specifier}")
        };
        let base = normalize_path(&joined);
        let base = base
            .strip_suffix(".js")
            .map(str::to_string)
            .unwrap_or(base);
        RESOLVE_SUFFIXES
            .iter()
            .find_map(|suffix| self.units.get(&format!("{base}{suffix}")))
    }

    /// Build the import resolution map seen from `unit`.
    ///
    /// The map is transitive: imports of imported units are followed
    /// breadth-first and recorded under the importing unit, so an imported
    /// initializer is flattened against its own imports. Each unit is visited
    /// once.
    pub fn import_map(&self, unit: &SourceUnit) -> ImportResolutionMap {
        let mut map = ImportResolutionMap::new(unit.path());
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Arc<SourceUnit>> = VecDeque::new();

        visited.insert(unit.path().to_string());
        self.collect_bindings(unit, &mut map, &mut visited, &mut queue);
        while let Some(next) = queue.pop_front() {
            self.collect_bindings(&next, &mut map, &mut visited, &mut queue);
        }
        debug!(unit = unit.path(), bindings = map.len(), "Built import resolution map");
        map
    }

    fn collect_bindings(
        &self,
        unit: &SourceUnit,
        map: &mut ImportResolutionMap,
        visited: &mut HashSet<String>,
        queue: &mut VecDeque<Arc<SourceUnit>>,
    ) {
        for import in unit.imports() {
            let Some(target) = self.resolve_specifier(unit, &import.specifier) else {
                trace!(specifier = %import.specifier, "Import is external to the project");
                continue;
            };
            if visited.insert(target.path().to_string()) {
                queue.push_back(Arc::clone(target));
            }
            if import.kind != ImportKind::Named {
                trace!(name = %import.local_name, "Only named imports are resolved");
                continue;
            }
            let Some(declaration) = target.exported_declaration(&import.imported_name) else {
                debug!(
                    name = %import.imported_name,
                    target = target.path(),
                    "Imported name is not an exported declaration"
                );
                continue;
            };
            let Some(initializer) = declaration.initializer.clone() else {
                debug!(
                    name = %import.imported_name,
                    target = target.path(),
                    "Imported declaration has no initializer"
                );
                continue;
            };
            let inserted = map.insert(
                unit.path(),
                ImportBinding {
                    identifier_name: import.local_name.clone(),
                    declared_name: declaration.name.clone(),
                    source_unit: Arc::clone(target),
                    initializer,
                },
            );
            if !inserted {
                debug!(name = %import.local_name, "Keeping earlier import binding");
            }
        }
    }
}

/// Normalize separators and `.`/`..` segments of a relative path.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().map(|p| *p != "..").unwrap_or(false) {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/a.ts"), "src/a.ts");
        assert_eq!(normalize_path("src/routers/../schemas/user"), "src/schemas/user");
        assert_eq!(normalize_path("src\\win\\path.ts"), "src/win/path.ts");
        assert_eq!(normalize_path("../outside"), "../outside");
    }

    #[test]
    fn test_resolve_specifier_tries_extensions() {
        let project = Project::from_sources([
            ("src/routers/user.router.ts", "import { a } from '../schemas';"),
            ("src/schemas/index.ts", "export const a = 1;"),
            ("src/routers/shared.ts", "export const b = 2;"),
        ])
        .unwrap();
        let router = project.unit("src/routers/user.router.ts").unwrap();

        let index = project.resolve_specifier(router, "../schemas").unwrap();
        assert_eq!(index.path(), "src/schemas/index.ts");
        let shared = project.resolve_specifier(router, "./shared.js").unwrap();
        assert_eq!(shared.path(), "src/routers/shared.ts");
        assert!(project.resolve_specifier(router, "zod").is_none());
        assert!(project.resolve_specifier(router, "./missing").is_none());
    }

    #[test]
    fn test_import_map_is_transitive() {
        let project = Project::from_sources([
            (
                "router.ts",
                "import { userSchema } from './user';\nimport { idSchema as id } from './ids';",
            ),
            (
                "user.ts",
                "import { nameSchema } from './names';\nexport const userSchema = z.object({ name: nameSchema });",
            ),
            ("names.ts", "export const nameSchema = z.string();"),
            ("ids.ts", "export const idSchema = z.string().uuid();"),
        ])
        .unwrap();
        let router = project.unit("router.ts").unwrap();
        let map = project.import_map(router);

        assert_eq!(map.root(), "router.ts");
        assert_eq!(map.len(), 3);
        let user = map.get("userSchema").unwrap();
        assert_eq!(user.source_unit.path(), "user.ts");
        assert_eq!(
            user.source_unit.text(&user.initializer),
            "z.object({ name: nameSchema })"
        );

        // Transitive imports are scoped to the unit that wrote them.
        assert!(!map.contains("nameSchema"));
        assert!(map.lookup("user.ts", "nameSchema").is_some());

        let id = map.get("id").unwrap();
        assert_eq!(id.declared_name, "idSchema");
        assert!(!map.contains("idSchema"));
    }

    #[test]
    fn test_same_name_imported_from_different_units_stays_separate() {
        let project = Project::from_sources([
            (
                "main.ts",
                "import { item } from './c';\nimport { list } from './a';",
            ),
            (
                "a.ts",
                "import { item } from './b';\nexport const list = z.array(item);",
            ),
            ("b.ts", "export const item = z.string();"),
            ("c.ts", "export const item = z.number();"),
        ])
        .unwrap();
        let map = project.import_map(project.unit("main.ts").unwrap());

        let main_item = map.get("item").unwrap();
        assert_eq!(main_item.source_unit.path(), "c.ts");
        let a_item = map.lookup("a.ts", "item").unwrap();
        assert_eq!(a_item.source_unit.path(), "b.ts");
    }

    #[test]
    fn test_import_map_binds_export_clauses_and_skips_private_names() {
        let project = Project::from_sources([
            (
                "main.ts",
                "import { publicName, hidden, direct } from './schemas';",
            ),
            (
                "schemas.ts",
                "const inner = z.string();\nconst hidden = z.number();\nexport const direct = z.boolean();\nexport { inner as publicName };",
            ),
        ])
        .unwrap();
        let map = project.import_map(project.unit("main.ts").unwrap());

        let public = map.get("publicName").unwrap();
        assert_eq!(public.declared_name, "inner");
        assert_eq!(public.source_unit.text(&public.initializer), "z.string()");
        assert!(map.contains("direct"));
        assert!(!map.contains("hidden"));
    }

    #[test]
    fn test_import_map_handles_import_cycles() {
        let project = Project::from_sources([
            ("a.ts", "import { b } from './b';\nexport const a = 1;"),
            ("b.ts", "import { a } from './a';\nexport const b = 2;"),
        ])
        .unwrap();
        let map = project.import_map(project.unit("a.ts").unwrap());
        assert!(map.contains("b"));
        assert!(map.lookup("b.ts", "a").is_some());
    }

    #[test]
    fn test_insert_keeps_first_binding_per_unit() {
        let project = Project::from_sources([("x.ts", "const x = 1;")]).unwrap();
        let unit = project.unit("x.ts").unwrap();
        let initializer = unit.declaration("x").unwrap().initializer.clone().unwrap();
        let mut map = ImportResolutionMap::new("main.ts");
        let binding = ImportBinding {
            identifier_name: "x".to_string(),
            declared_name: "x".to_string(),
            source_unit: Arc::clone(unit),
            initializer,
        };
        assert!(map.insert("main.ts", binding.clone()));
        assert!(!map.insert("main.ts", binding.clone()));
        assert!(map.insert("other.ts", binding));
        assert_eq!(map.len(), 2);
        assert!(map.contains("x"));
    }
}

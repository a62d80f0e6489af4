use super::expr::{Expr, ExprKind, Property};
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

const SNIPPET_BINDING: &str = "__trpcgen_snippet";

/// A module-level variable declaration (`const`, `let`, `var`, `declare const`)
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Declared name
    pub name: String,
    /// Initializer expression, absent for `declare const x: T;`
    pub initializer: Option<Expr>,
    /// Whether the declaration is `export`ed
    pub exported: bool,
}

/// How a name was brought into scope by an `import` statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import { a } from '...'` or `import { a as b } from '...'`
    Named,
    /// `import a from '...'`
    Default,
    /// `import * as a from '...'`
    Namespace,
}

/// One name introduced by an `import` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// Name visible inside the importing unit
    pub local_name: String,
    /// Name exported by the target module (same as `local_name` unless aliased)
    pub imported_name: String,
    /// Module specifier exactly as written, without quotes
    pub specifier: String,
    pub kind: ImportKind,
}

/// A parsed TypeScript source file.
///
/// Immutable once parsed. Exposes top-level declarations by name, the import
/// statements, and the raw text of any expression parsed from it.
pub struct SourceUnit {
    path: String,
    text: String,
    tree: Tree,
    declarations: HashMap<String, Declaration>,
    /// `export { local as exported }` clauses: exported name → local name
    export_aliases: HashMap<String, String>,
    imports: Vec<ImportDeclaration>,
}

impl std::fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceUnit")
            .field("path", &self.path)
            .field("declarations", &self.declarations.len())
            .field("imports", &self.imports)
            .finish()
    }
}

/// Build a tree-sitter parser for TypeScript.
fn typescript_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    let language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT;
    parser
        .set_language(&language.into())
        .context("Failed to load the TypeScript grammar")?;
    Ok(parser)
}

impl SourceUnit {
    /// Parse `text` as the TypeScript module at `path`.
    ///
    /// Syntax errors do not fail the parse: tree-sitter recovers and the
    /// well-formed declarations are still collected.
    pub fn parse(path: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let mut parser = typescript_parser()?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| anyhow!("Parser produced no syntax tree for {path}"))?;

        let mut declarations = HashMap::new();
        let mut export_aliases = HashMap::new();
        let mut imports = Vec::new();
        {
            let root = tree.root_node();
            if root.has_error() {
                warn!(path = %path, "Source contains syntax errors, using recovered tree");
            }
            let mut cursor = root.walk();
            for statement in root.named_children(&mut cursor) {
                let mut sink = Collected {
                    declarations: &mut declarations,
                    export_aliases: &mut export_aliases,
                    imports: &mut imports,
                };
                collect_statement(statement, &text, false, &mut sink);
            }
        }
        debug!(
            path = %path,
            declarations = declarations.len(),
            imports = imports.len(),
            "Parsed source unit"
        );

        Ok(SourceUnit {
            path,
            text,
            tree,
            declarations,
            export_aliases,
            imports,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full source text of the unit
    pub fn source(&self) -> &str {
        &self.text
    }

    /// Raw source slice of an expression parsed from this unit.
    pub fn text(&self, expr: &Expr) -> &str {
        self.text.get(expr.span.clone()).unwrap_or("")
    }

    /// Top-level variable declaration named `name`.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// Declaration another module gets by importing `name` from this unit.
    ///
    /// Covers `export const name = ...` and `export { local as name }`.
    /// Re-exports from other modules are not followed.
    pub fn exported_declaration(&self, name: &str) -> Option<&Declaration> {
        if let Some(declaration) = self.declarations.get(name).filter(|d| d.exported) {
            return Some(declaration);
        }
        self.export_aliases
            .get(name)
            .and_then(|local| self.declarations.get(local))
    }

    pub fn imports(&self) -> &[ImportDeclaration] {
        &self.imports
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.tree
    }
}

/// A standalone expression parsed outside of any file, e.g. a decorator
/// argument or an expression typed on the command line.
///
/// Spans of `expr` index into `text`.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub text: String,
    pub expr: Expr,
}

impl Snippet {
    /// Parse `text` as a single TypeScript expression.
    pub fn parse(text: &str) -> Result<Self> {
        let prefix = format!("const {SNIPPET_BINDING} =\n");
        let wrapped = format!("{prefix}{text}\n;");
        let unit = SourceUnit::parse("<snippet>", wrapped)?;
        let root = unit.tree().root_node();
        if root.has_error() {
            bail!("Could not parse expression `{text}`");
        }
        if !is_single_declarator(root) {
            bail!("Expression `{text}` is not a single expression");
        }
        let mut expr = unit
            .declaration(SNIPPET_BINDING)
            .and_then(|d| d.initializer.clone())
            .ok_or_else(|| anyhow!("Could not parse expression `{text}`"))?;
        if expr.span.start < prefix.len() || expr.span.end > prefix.len() + text.len() {
            bail!("Expression `{text}` is not a single expression");
        }
        expr.rebase(prefix.len());
        Ok(Snippet {
            text: text.to_string(),
            expr,
        })
    }
}

/// The wrapped snippet must be exactly one statement declaring one binding;
/// anything else means the text held more than one expression.
fn is_single_declarator(root: Node<'_>) -> bool {
    let significant = |node: &Node<'_>| !matches!(node.kind(), "comment" | "empty_statement");
    let mut cursor = root.walk();
    let statements: Vec<Node<'_>> = root
        .named_children(&mut cursor)
        .filter(|node| significant(node))
        .collect();
    let [statement] = statements.as_slice() else {
        return false;
    };
    let mut cursor = statement.walk();
    let declarators = statement
        .named_children(&mut cursor)
        .filter(|node| significant(node))
        .count();
    declarators == 1
}

/// Tables filled while walking the top-level statements of a unit
struct Collected<'a> {
    declarations: &'a mut HashMap<String, Declaration>,
    export_aliases: &'a mut HashMap<String, String>,
    imports: &'a mut Vec<ImportDeclaration>,
}

fn collect_statement(node: Node<'_>, source: &str, exported: bool, sink: &mut Collected<'_>) {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let Some(name_node) = declarator.child_by_field_name("name") else {
                    continue;
                };
                // Destructuring patterns do not declare a single schema.
                if name_node.kind() != "identifier" {
                    continue;
                }
                let name = node_text(name_node, source);
                let initializer = declarator
                    .child_by_field_name("value")
                    .map(|value| lower_expr(value, source));
                sink.declarations.entry(name.clone()).or_insert(Declaration {
                    name,
                    initializer,
                    exported,
                });
            }
        }
        "export_statement" => {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                collect_statement(declaration, source, true, sink);
            } else if node.child_by_field_name("source").is_none() {
                collect_export_clause(node, source, sink.export_aliases);
            }
        }
        "ambient_declaration" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_statement(child, source, exported, sink);
            }
        }
        "import_statement" => collect_import(node, source, sink.imports),
        _ => {}
    }
}

fn collect_export_clause(node: Node<'_>, source: &str, aliases: &mut HashMap<String, String>) {
    let mut cursor = node.walk();
    for clause in node.named_children(&mut cursor) {
        if clause.kind() != "export_clause" {
            continue;
        }
        let mut clause_cursor = clause.walk();
        for specifier in clause.named_children(&mut clause_cursor) {
            if specifier.kind() != "export_specifier" {
                continue;
            }
            let Some(name_node) = specifier.child_by_field_name("name") else {
                continue;
            };
            let local = node_text(name_node, source);
            let exported = specifier
                .child_by_field_name("alias")
                .map(|alias| node_text(alias, source))
                .unwrap_or_else(|| local.clone());
            aliases.entry(exported).or_insert(local);
        }
    }
}

fn collect_import(node: Node<'_>, source: &str, imports: &mut Vec<ImportDeclaration>) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let specifier = unquote(&node_text(source_node, source));

    let mut cursor = node.walk();
    for clause in node.named_children(&mut cursor) {
        if clause.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = clause.walk();
        for part in clause.named_children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => {
                    let name = node_text(part, source);
                    imports.push(ImportDeclaration {
                        local_name: name.clone(),
                        imported_name: name,
                        specifier: specifier.clone(),
                        kind: ImportKind::Default,
                    });
                }
                "namespace_import" => {
                    let mut ns_cursor = part.walk();
                    let local = part
                        .named_children(&mut ns_cursor)
                        .find(|n| n.kind() == "identifier");
                    if let Some(local) = local {
                        let name = node_text(local, source);
                        imports.push(ImportDeclaration {
                            local_name: name.clone(),
                            imported_name: name,
                            specifier: specifier.clone(),
                            kind: ImportKind::Namespace,
                        });
                    }
                }
                "named_imports" => {
                    let mut named_cursor = part.walk();
                    for spec in part.named_children(&mut named_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name_node) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported_name = unquote(&node_text(name_node, source));
                        let local_name = spec
                            .child_by_field_name("alias")
                            .map(|alias| node_text(alias, source))
                            .unwrap_or_else(|| imported_name.clone());
                        imports.push(ImportDeclaration {
                            local_name,
                            imported_name,
                            specifier: specifier.clone(),
                            kind: ImportKind::Named,
                        });
                    }
                }
                _ => {}
            }
        }
    }
}

/// Convert a tree-sitter expression node into an [`Expr`].
fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let span = node.byte_range();
    let kind = match node.kind() {
        "identifier" => ExprKind::Identifier(node_text(node, source)),
        "object" => {
            let mut properties = Vec::new();
            let mut cursor = node.walk();
            for member in node.named_children(&mut cursor) {
                if member.is_extra() {
                    continue;
                }
                if member.kind() == "pair" {
                    let key = member
                        .child_by_field_name("key")
                        .map(|k| node_text(k, source))
                        .unwrap_or_default();
                    let value = member
                        .child_by_field_name("value")
                        .map(|v| lower_expr(v, source));
                    properties.push(Property { key, value });
                } else {
                    properties.push(Property {
                        key: node_text(member, source),
                        value: None,
                    });
                }
            }
            ExprKind::Object(properties)
        }
        "array" => {
            let mut cursor = node.walk();
            let elements = node
                .named_children(&mut cursor)
                .filter(|n| !n.is_extra())
                .map(|n| lower_expr(n, source))
                .collect();
            ExprKind::Array(elements)
        }
        "call_expression" => {
            match (
                node.child_by_field_name("function"),
                node.child_by_field_name("arguments"),
            ) {
                (Some(function), Some(args)) if args.kind() == "arguments" => {
                    let mut cursor = args.walk();
                    let arguments = args
                        .named_children(&mut cursor)
                        .filter(|n| !n.is_extra())
                        .map(|n| lower_expr(n, source))
                        .collect();
                    ExprKind::Call {
                        callee: Box::new(lower_expr(function, source)),
                        arguments,
                    }
                }
                // Tagged templates and malformed calls
                _ => ExprKind::Opaque,
            }
        }
        "member_expression" => {
            match (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) {
                (Some(object), Some(property)) => ExprKind::PropertyAccess {
                    base: Box::new(lower_expr(object, source)),
                    property: node_text(property, source),
                },
                _ => ExprKind::Opaque,
            }
        }
        _ => ExprKind::Opaque,
    };
    Expr::new(span, kind)
}

pub(crate) fn node_text(node: Node<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .trim()
        .to_string()
}

pub(crate) fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

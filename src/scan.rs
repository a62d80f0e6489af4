//! # Scan Module
//!
//! Discovers routers and middlewares in parsed source units.
//!
//! - A class decorated with `@Router(...)` is a router. Each of its decorated
//!   methods becomes a [`ProcedureMetadata`]; the router's `alias` comes from
//!   the `alias` property of the decorator's object argument.
//! - A class with a `use` method that carries a return type annotation is a
//!   middleware. The annotation text is its context type, from which the
//!   context output shape is later extracted.
//!
//! Decorator arguments are recorded as source text. Object-literal arguments
//! contribute one entry per `key: value` pair; any other argument is keyed by
//! its position (`"0"`, `"1"`, ...).

use crate::procedure::{DecoratorKind, DecoratorMetadata, ProcedureMetadata};
use crate::source::{node_text, unquote, Project, SourceUnit};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tree_sitter::Node;

const ROUTER_DECORATOR: &str = "Router";
const MIDDLEWARE_METHOD: &str = "use";

/// A `@Router` class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterMetadata {
    /// Class name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Path of the unit declaring the class
    pub path: String,
    #[serde(default)]
    pub procedures: Vec<ProcedureMetadata>,
}

/// A middleware class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareMetadata {
    pub name: String,
    pub path: String,
    /// Return type annotation of the `use` method
    pub context_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutput {
    pub routers: Vec<RouterMetadata>,
    pub middlewares: Vec<MiddlewareMetadata>,
}

impl ScanOutput {
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty() && self.middlewares.is_empty()
    }

    pub fn middleware(&self, name: &str) -> Option<&MiddlewareMetadata> {
        self.middlewares.iter().find(|m| m.name == name)
    }

    pub fn extend(&mut self, other: ScanOutput) {
        self.routers.extend(other.routers);
        self.middlewares.extend(other.middlewares);
    }
}

/// Scan every unit of `project`, in path order.
pub fn scan_project(project: &Project) -> ScanOutput {
    let mut output = ScanOutput::default();
    for unit in project.units() {
        output.extend(scan_unit(unit));
    }
    info!(
        routers = output.routers.len(),
        middlewares = output.middlewares.len(),
        "Scanned project"
    );
    output
}

/// Scan the top-level classes of one unit, in declaration order.
pub fn scan_unit(unit: &SourceUnit) -> ScanOutput {
    let source = unit.source();
    let mut output = ScanOutput::default();
    let root = unit.tree().root_node();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        let (class, outer_decorators) = match statement.kind() {
            "class_declaration" | "abstract_class_declaration" => (statement, Vec::new()),
            "export_statement" => match statement.child_by_field_name("declaration") {
                Some(declaration) if is_class(declaration) => {
                    (declaration, decorator_nodes(statement))
                }
                _ => continue,
            },
            _ => continue,
        };
        scan_class(class, outer_decorators, unit.path(), source, &mut output);
    }
    if !output.is_empty() {
        debug!(
            path = unit.path(),
            routers = output.routers.len(),
            middlewares = output.middlewares.len(),
            "Found routers and middlewares"
        );
    }
    output
}

fn is_class(node: Node<'_>) -> bool {
    matches!(node.kind(), "class_declaration" | "abstract_class_declaration")
}

fn scan_class<'t>(
    class: Node<'t>,
    mut decorators: Vec<Node<'t>>,
    path: &str,
    source: &str,
    output: &mut ScanOutput,
) {
    let Some(name) = class
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
    else {
        return;
    };
    let Some(body) = class.child_by_field_name("body") else {
        return;
    };
    decorators.extend(decorator_nodes(class));

    let router = decorators.iter().find_map(|decorator| {
        let (decorator_name, args) = decorator_name_and_args(*decorator, source)?;
        (decorator_name == ROUTER_DECORATOR).then_some(args)
    });

    let methods = class_methods(body, source);

    if let Some(args) = router {
        let alias = args.iter().find_map(|arg| object_property(*arg, "alias", source));
        let procedures = methods
            .iter()
            .filter(|m| !m.decorators.is_empty())
            .map(|m| ProcedureMetadata {
                name: m.name.clone(),
                decorators: m.decorators.clone(),
            })
            .collect();
        output.routers.push(RouterMetadata {
            name: name.clone(),
            alias,
            path: path.to_string(),
            procedures,
        });
    }

    let context_type = methods
        .iter()
        .find(|m| m.name == MIDDLEWARE_METHOD)
        .and_then(|m| m.return_type.clone());
    if let Some(context_type) = context_type {
        output.middlewares.push(MiddlewareMetadata {
            name,
            path: path.to_string(),
            context_type,
        });
    }
}

struct Method {
    name: String,
    decorators: Vec<DecoratorMetadata>,
    return_type: Option<String>,
}

fn class_methods(body: Node<'_>, source: &str) -> Vec<Method> {
    let mut methods = Vec::new();
    // Decorators may precede a member as siblings inside the class body.
    let mut pending: Vec<Node<'_>> = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "decorator" => pending.push(member),
            "method_definition" => {
                let mut decorators = std::mem::take(&mut pending);
                decorators.extend(decorator_nodes(member));
                let Some(name) = member
                    .child_by_field_name("name")
                    .map(|n| unquote(&node_text(n, source)))
                else {
                    continue;
                };
                let return_type = member.child_by_field_name("return_type").map(|t| {
                    node_text(t, source)
                        .trim_start_matches(':')
                        .trim()
                        .to_string()
                });
                methods.push(Method {
                    name,
                    decorators: decorators
                        .into_iter()
                        .filter_map(|d| decorator_metadata(d, source))
                        .collect(),
                    return_type,
                });
            }
            "comment" => {}
            _ => pending.clear(),
        }
    }
    methods
}

fn decorator_nodes(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "decorator" {
            out.push(child);
        }
    }
    out
}

/// Name (last segment of `@a.b.Name(...)`) and argument nodes of a decorator.
fn decorator_name_and_args<'a>(node: Node<'a>, source: &str) -> Option<(String, Vec<Node<'a>>)> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "call_expression" => {
                let target = child.child_by_field_name("function")?;
                let raw = node_text(target, source);
                let name = raw.rsplit('.').next().unwrap_or(raw.as_str()).to_string();
                return Some((name, call_arguments(child)));
            }
            "identifier" | "member_expression" => {
                let raw = node_text(child, source);
                let name = raw.rsplit('.').next().unwrap_or(raw.as_str()).to_string();
                return Some((name, Vec::new()));
            }
            _ => {}
        }
    }
    None
}

fn call_arguments(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let Some(args) = node.child_by_field_name("arguments") else {
        return out;
    };
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if !child.is_extra() {
            out.push(child);
        }
    }
    out
}

fn decorator_metadata(node: Node<'_>, source: &str) -> Option<DecoratorMetadata> {
    let (name, args) = decorator_name_and_args(node, source)?;
    let mut metadata = DecoratorMetadata::new(DecoratorKind::from_name(&name));
    for (index, arg) in args.into_iter().enumerate() {
        if arg.kind() != "object" {
            metadata
                .arguments
                .insert(index.to_string(), node_text(arg, source));
            continue;
        }
        let mut cursor = arg.walk();
        for member in arg.named_children(&mut cursor) {
            match member.kind() {
                "pair" => {
                    let (Some(key), Some(value)) = (
                        member.child_by_field_name("key"),
                        member.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    metadata
                        .arguments
                        .insert(unquote(&node_text(key, source)), node_text(value, source));
                }
                "shorthand_property_identifier" => {
                    let name = node_text(member, source);
                    metadata.arguments.insert(name.clone(), name);
                }
                _ => {}
            }
        }
    }
    Some(metadata)
}

/// String value of `key` when `node` is an object literal declaring it.
fn object_property(node: Node<'_>, key: &str, source: &str) -> Option<String> {
    if node.kind() != "object" {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find_map(|member| {
        if member.kind() != "pair" {
            return None;
        }
        let member_key = member.child_by_field_name("key")?;
        if unquote(&node_text(member_key, source)) != key {
            return None;
        }
        member
            .child_by_field_name("value")
            .map(|value| unquote(&node_text(value, source)))
    });
    found
}

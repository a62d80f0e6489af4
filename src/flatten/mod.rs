//! # Flatten Module
//!
//! Inlines named schema references so a schema-definition expression can be
//! compiled on its own, away from the files that declared its parts.
//!
//! ## Overview
//!
//! Given an expression such as `userSchema.extend({ role: roleSchema })`, the
//! flattener replaces every identifier it can resolve with the flattened text
//! of that identifier's initializer:
//!
//! ```text
//! z.object({ id: z.string() }).extend({ role: z.enum(["admin", "user"]) })
//! ```
//!
//! Identifiers are resolved, in order:
//!
//! 1. **Builder roots** (`z` by default) are never resolved
//! 2. **Local declarations** in the unit being flattened
//! 3. **Imports** of that unit through the [`ImportResolutionMap`]; the imported
//!    initializer is flattened against its own unit and that unit's imports
//!
//! Anything else is left verbatim; the compiler that consumes the generated
//! router reports it precisely.
//!
//! ## Rendering
//!
//! The expression tree is never mutated. Each node renders to its own source
//! slice with its rewritten children spliced in at their exact spans, so
//! untouched syntax (spacing, comments, type arguments) survives and two
//! identical-looking slices can never be confused.
//!
//! ## Cycles
//!
//! The active resolution path is tracked as `(unit, declared name)` frames, so an
//! aliased import and a local of the same name in the target unit stay apart.
//! Re-entering a frame yields [`FlattenError::CyclicReference`] with the chain of
//! identifiers; a path longer than `max_depth` yields
//! [`FlattenError::DepthExceeded`].

mod error;

pub use error::FlattenError;

use crate::source::{Expr, ExprKind, ImportResolutionMap, Snippet, SourceUnit};
use tracing::{debug, trace};

/// Builder namespaces whose chains are native schema constructors
pub const DEFAULT_BUILDER_ROOTS: &[&str] = &["z"];

/// Default limit on the identifier resolution path
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tuning for a [`Flattener`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Identifiers that name the schema builder namespace; never inlined
    pub builder_roots: Vec<String>,
    /// Maximum number of nested identifier resolutions
    pub max_depth: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        FlattenOptions {
            builder_roots: DEFAULT_BUILDER_ROOTS.iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    unit: String,
    name: String,
}

/// Resolves and inlines identifier references inside expressions.
///
/// Holds no state between calls: flattening the same expression against the
/// same unit and import map always yields the same text.
#[derive(Debug, Clone)]
pub struct Flattener<'a> {
    imports: &'a ImportResolutionMap,
    options: FlattenOptions,
}

/// Flatten `expr` (parsed from `unit`) with default options.
pub fn flatten(
    expr: &Expr,
    imports: &ImportResolutionMap,
    unit: &SourceUnit,
) -> Result<String, FlattenError> {
    Flattener::new(imports).flatten(expr, unit)
}

impl<'a> Flattener<'a> {
    pub fn new(imports: &'a ImportResolutionMap) -> Self {
        Self::with_options(imports, FlattenOptions::default())
    }

    pub fn with_options(imports: &'a ImportResolutionMap, options: FlattenOptions) -> Self {
        Flattener { imports, options }
    }

    /// Flatten an expression that was parsed from `unit`.
    pub fn flatten(&self, expr: &Expr, unit: &SourceUnit) -> Result<String, FlattenError> {
        let mut path = Vec::new();
        self.render(expr, unit.source(), unit, &mut path)
    }

    /// Flatten a standalone snippet, resolving its identifiers against `scope`.
    pub fn flatten_snippet(
        &self,
        snippet: &Snippet,
        scope: &SourceUnit,
    ) -> Result<String, FlattenError> {
        let mut path = Vec::new();
        self.render(&snippet.expr, &snippet.text, scope, &mut path)
    }

    /// Flatten the initializer of the top-level declaration `name` in `unit`.
    ///
    /// Returns `None` when there is no such declaration or it has no initializer.
    pub fn flatten_declaration(
        &self,
        name: &str,
        unit: &SourceUnit,
    ) -> Result<Option<String>, FlattenError> {
        let Some(initializer) = unit
            .declaration(name)
            .and_then(|declaration| declaration.initializer.as_ref())
        else {
            return Ok(None);
        };
        let mut path = Vec::new();
        self.enter(unit.path(), name, &mut path, |this, path| {
            this.render(initializer, unit.source(), unit, path)
        })
        .map(Some)
    }

    fn is_builder_root(&self, name: &str) -> bool {
        self.options.builder_roots.iter().any(|root| root == name)
    }

    fn render(
        &self,
        expr: &Expr,
        text: &str,
        scope: &SourceUnit,
        path: &mut Vec<Frame>,
    ) -> Result<String, FlattenError> {
        match &expr.kind {
            ExprKind::Identifier(name) => self.resolve_identifier(name, expr, text, scope, path),
            ExprKind::Opaque => Ok(slice(text, expr).to_string()),
            ExprKind::Object(_)
            | ExprKind::Array(_)
            | ExprKind::Call { .. }
            | ExprKind::PropertyAccess { .. } => self.splice(expr, text, scope, path),
        }
    }

    /// Render `expr` as its own source slice with every rewritable child
    /// replaced by that child's rendering.
    fn splice(
        &self,
        expr: &Expr,
        text: &str,
        scope: &SourceUnit,
        path: &mut Vec<Frame>,
    ) -> Result<String, FlattenError> {
        let mut out = String::with_capacity(expr.span.len());
        let mut cursor = expr.span.start;
        for child in expr.rewritable_children() {
            if child.span.start < cursor || child.span.end > expr.span.end {
                trace!(span = ?child.span, "Skipping child outside of its parent slice");
                continue;
            }
            out.push_str(text.get(cursor..child.span.start).unwrap_or(""));
            out.push_str(&self.render(child, text, scope, path)?);
            cursor = child.span.end;
        }
        out.push_str(text.get(cursor..expr.span.end).unwrap_or(""));
        Ok(out)
    }

    fn resolve_identifier(
        &self,
        name: &str,
        expr: &Expr,
        text: &str,
        scope: &SourceUnit,
        path: &mut Vec<Frame>,
    ) -> Result<String, FlattenError> {
        let verbatim = || -> Result<String, FlattenError> { Ok(slice(text, expr).to_string()) };

        if self.is_builder_root(name) {
            return verbatim();
        }

        if let Some(declaration) = scope.declaration(name) {
            // A declaration shadows imports even when it has no initializer.
            let Some(initializer) = &declaration.initializer else {
                return verbatim();
            };
            return self.enter(scope.path(), name, path, |this, path| {
                this.render(initializer, scope.source(), scope, path)
            });
        }

        if let Some(binding) = self.imports.lookup(scope.path(), name) {
            let unit = binding.source_unit.as_ref();
            return self.enter(unit.path(), &binding.declared_name, path, |this, path| {
                this.render(&binding.initializer, unit.source(), unit, path)
            });
        }

        debug!(identifier = name, unit = scope.path(), "Leaving unresolved identifier as is");
        verbatim()
    }

    fn enter<F>(
        &self,
        unit: &str,
        name: &str,
        path: &mut Vec<Frame>,
        resolve: F,
    ) -> Result<String, FlattenError>
    where
        F: FnOnce(&Self, &mut Vec<Frame>) -> Result<String, FlattenError>,
    {
        let frame = Frame {
            unit: unit.to_string(),
            name: name.to_string(),
        };
        if let Some(start) = path.iter().position(|f| *f == frame) {
            let mut chain: Vec<String> = path[start..].iter().map(|f| f.name.clone()).collect();
            chain.push(frame.name);
            return Err(FlattenError::CyclicReference { chain });
        }
        if path.len() >= self.options.max_depth {
            return Err(FlattenError::DepthExceeded {
                max_depth: self.options.max_depth,
                identifier: frame.name,
            });
        }

        path.push(frame);
        let result = resolve(self, path);
        path.pop();
        result
    }
}

fn slice<'t>(text: &'t str, expr: &Expr) -> &'t str {
    text.get(expr.span.clone()).unwrap_or("")
}

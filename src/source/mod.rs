//! # Source Module
//!
//! Parsed TypeScript sources as seen by the generator.
//!
//! - [`SourceUnit`] - one parsed file: top-level declarations, imports and raw text
//! - [`Expr`] - schema-definition expressions as read-only views over source text
//! - [`Snippet`] - a standalone expression parsed outside of any file
//! - [`Project`] - all units of an application, with relative-import resolution
//! - [`ImportResolutionMap`] - identifiers brought in from other units, with the
//!   initializer that defines them
//!
//! Parsing uses tree-sitter's TypeScript grammar. Only the subset of syntax the
//! flattener cares about is lowered into [`ExprKind`] variants; everything else
//! becomes [`ExprKind::Opaque`] and is carried through verbatim.

mod expr;
mod project;
mod unit;

pub use expr::{Expr, ExprKind, Property};
pub use project::{normalize_path, ImportBinding, ImportResolutionMap, Project};
pub use unit::{Declaration, ImportDeclaration, ImportKind, Snippet, SourceUnit};

pub(crate) use unit::{node_text, unquote};

//! # Procedure Module
//!
//! Decorator metadata of route-handler methods, and the synthesizer that turns
//! it into one tRPC procedure definition.
//!
//! A controller method such as
//!
//! ```typescript
//! @Query({ input: getUserInput, output: userSchema })
//! getUser(@Input() input: GetUserInput) { ... }
//! ```
//!
//! becomes
//!
//! ```text
//! getUser: publicProcedure.input(getUserInput).output(userSchema).query(async () => "PLACEHOLDER_DO_NOT_REMOVE" as any)
//! ```
//!
//! The body is a recognizable sentinel; the real implementation is bound at
//! runtime, so the generated router only needs the procedure's shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Builder every generated procedure chains from unless configured otherwise
pub const DEFAULT_PROCEDURE_BUILDER: &str = "publicProcedure";

/// Sentinel implementation emitted as every procedure body
pub const PLACEHOLDER_IMPLEMENTATION: &str = r#"async () => "PLACEHOLDER_DO_NOT_REMOVE" as any"#;

/// Known decorator names.
///
/// Anything unrecognized is kept as [`DecoratorKind::Other`] so metadata
/// survives a round trip through `scan` output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DecoratorKind {
    Query,
    Mutation,
    UseMiddlewares,
    UseGuards,
    Other(String),
}

impl DecoratorKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Query" => DecoratorKind::Query,
            "Mutation" => DecoratorKind::Mutation,
            "UseMiddlewares" => DecoratorKind::UseMiddlewares,
            "UseGuards" => DecoratorKind::UseGuards,
            other => DecoratorKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DecoratorKind::Query => "Query",
            DecoratorKind::Mutation => "Mutation",
            DecoratorKind::UseMiddlewares => "UseMiddlewares",
            DecoratorKind::UseGuards => "UseGuards",
            DecoratorKind::Other(name) => name,
        }
    }

    /// Procedure type this decorator declares, if any.
    pub fn procedure_type(&self) -> Option<ProcedureType> {
        match self {
            DecoratorKind::Query => Some(ProcedureType::Query),
            DecoratorKind::Mutation => Some(ProcedureType::Mutation),
            _ => None,
        }
    }
}

impl From<String> for DecoratorKind {
    fn from(name: String) -> Self {
        DecoratorKind::from_name(&name)
    }
}

impl From<DecoratorKind> for String {
    fn from(kind: DecoratorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DecoratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// tRPC procedure type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureType {
    Query,
    Mutation,
}

impl ProcedureType {
    /// Name of the terminating builder method
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureType::Query => "query",
            ProcedureType::Mutation => "mutation",
        }
    }
}

/// One decorator attached to a procedure.
///
/// `arguments` maps argument names to their source text, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorMetadata {
    #[serde(rename = "name")]
    pub kind: DecoratorKind,
    #[serde(default)]
    pub arguments: IndexMap<String, String>,
}

impl DecoratorMetadata {
    pub fn new(kind: DecoratorKind) -> Self {
        DecoratorMetadata {
            kind,
            arguments: IndexMap::new(),
        }
    }

    /// Append an argument, keeping declaration order.
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// One route-handler method and its decorators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureMetadata {
    pub name: String,
    #[serde(default)]
    pub decorators: Vec<DecoratorMetadata>,
}

impl ProcedureMetadata {
    /// First decorator declaring a query or mutation, with its type.
    pub fn procedure_decorator(&self) -> Option<(&DecoratorMetadata, ProcedureType)> {
        self.decorators
            .iter()
            .find_map(|d| d.kind.procedure_type().map(|ty| (d, ty)))
    }

    /// Argument values of every `@UseMiddlewares` decorator, in order.
    pub fn middlewares(&self) -> impl Iterator<Item = &str> {
        self.decorators
            .iter()
            .filter(|d| d.kind == DecoratorKind::UseMiddlewares)
            .flat_map(|d| d.arguments.values().map(String::as_str))
    }
}

/// Rendering choices for [`synthesize_procedure`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubOptions {
    /// Expression the argument chain starts from
    pub builder_root: String,
    /// Procedure body
    pub placeholder: String,
}

impl Default for StubOptions {
    fn default() -> Self {
        StubOptions {
            builder_root: DEFAULT_PROCEDURE_BUILDER.to_string(),
            placeholder: PLACEHOLDER_IMPLEMENTATION.to_string(),
        }
    }
}

/// Render one procedure as `<name>: <builder>.<key>(<value>)....<query|mutation>(<placeholder>)`.
///
/// Procedures without a `@Query` or `@Mutation` decorator yield an empty
/// string and are left out of the router.
pub fn synthesize_procedure(metadata: &ProcedureMetadata, options: &StubOptions) -> String {
    let Some((decorator, procedure_type)) = metadata.procedure_decorator() else {
        debug!(procedure = %metadata.name, "No query or mutation decorator, omitting procedure");
        return String::new();
    };

    let argument_chain: String = decorator
        .arguments
        .iter()
        .map(|(key, value)| format!(".{key}({value})"))
        .collect();

    format!(
        "{}: {}{}.{}({})",
        metadata.name,
        options.builder_root,
        argument_chain,
        procedure_type.as_str(),
        options.placeholder
    )
}

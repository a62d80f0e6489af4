//! # Generator Module
//!
//! Produces a single, self-contained tRPC app router module from scanned
//! routers and middlewares.
//!
//! ## Pipeline
//!
//! ```text
//! Source tree → Project → Scan → Flatten decorator arguments → Stubs → Askama → server.ts
//! ```
//!
//! 1. **Project** - every `.ts`/`.tsx` file under the root is parsed once
//! 2. **Scan** - `@Router` classes, their decorated methods, and middlewares
//! 3. **Flatten** - each decorator argument is parsed as an expression and its
//!    schema references are inlined against the router's file and imports
//! 4. **Stubs** - one procedure definition per `@Query`/`@Mutation` method
//! 5. **Render** - the `app_router.ts.txt` template assembles the module
//!
//! The generated module only carries procedure shapes. Every body is a
//! placeholder; the real handlers are bound at runtime.
//!
//! ## Middlewares
//!
//! A procedure whose first `@UseMiddlewares` entry names a scanned middleware
//! with a `_ctx_out` shape chains from a dedicated builder
//! (`authMiddlewareProcedure` for `AuthMiddleware`) whose context is typed with
//! that shape. Other procedures chain from the configured procedure builder.

mod templates;
#[cfg(test)]
mod tests;

pub use templates::{render_app_router, AppRouterTemplateData, MiddlewareBuilder, RouterEntry};

use crate::config::GeneratorConfig;
use crate::context::find_context_output_shape;
use crate::flatten::Flattener;
use crate::procedure::{synthesize_procedure, ProcedureMetadata};
use crate::scan::{RouterMetadata, ScanOutput};
use crate::source::{Project, Snippet, SourceUnit};
use anyhow::Context;
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Generate the app router module for `scan`, resolving schemas in `project`.
///
/// # Errors
///
/// Returns an error if a router's source file is not part of the project, a
/// decorator argument has a cyclic or too deep schema reference chain, or the
/// template fails to render.
pub fn generate_app_router(
    project: &Project,
    scan: &ScanOutput,
    config: &GeneratorConfig,
) -> anyhow::Result<String> {
    let mut middlewares: IndexMap<String, MiddlewareBuilder> = IndexMap::new();
    let mut routers = Vec::with_capacity(scan.routers.len());

    for router in &scan.routers {
        let unit = project
            .unit(&router.path)
            .with_context(|| format!("Router {} refers to unknown file {}", router.name, router.path))?;
        let imports = project.import_map(unit);
        let flattener = Flattener::with_options(&imports, config.flatten_options());

        let mut procedures = Vec::with_capacity(router.procedures.len());
        for procedure in &router.procedures {
            let flattened = flatten_arguments(&flattener, router, procedure, unit)?;

            let builder = middleware_builder(&flattened, scan);
            let builder_root = builder.as_ref().map(|b| b.builder.clone());
            if let Some(builder) = builder {
                middlewares.entry(builder.name.clone()).or_insert(builder);
            }

            let stub = synthesize_procedure(&flattened, &config.stub_options(builder_root.as_deref()));
            if !stub.is_empty() {
                procedures.push(stub);
            }
        }

        debug!(
            router = %router.name,
            procedures = procedures.len(),
            "Synthesized router procedures"
        );
        routers.push(RouterEntry {
            key: router_key(router),
            procedures,
        });
    }

    let data = AppRouterTemplateData {
        schema_namespace: config.builder_roots.first().cloned(),
        schema_import: config.schema_import.clone(),
        procedure_builder: config.procedure_builder.clone(),
        middlewares: middlewares.into_values().collect(),
        routers,
    };
    render_app_router(&data).context("Failed to render app router template")
}

/// Copy of `procedure` with every decorator argument flattened.
fn flatten_arguments(
    flattener: &Flattener<'_>,
    router: &RouterMetadata,
    procedure: &ProcedureMetadata,
    unit: &SourceUnit,
) -> anyhow::Result<ProcedureMetadata> {
    let mut flattened = procedure.clone();
    for decorator in &mut flattened.decorators {
        for (key, value) in decorator.arguments.iter_mut() {
            let snippet = match Snippet::parse(value) {
                Ok(snippet) => snippet,
                Err(err) => {
                    warn!(
                        router = %router.name,
                        procedure = %procedure.name,
                        argument = %key,
                        error = %err,
                        "Keeping decorator argument verbatim"
                    );
                    continue;
                }
            };
            *value = flattener.flatten_snippet(&snippet, unit).with_context(|| {
                format!(
                    "Failed to flatten '{key}' of @{} on {}.{}",
                    decorator.kind, router.name, procedure.name
                )
            })?;
        }
    }
    Ok(flattened)
}

/// Builder for the procedure's first middleware, when its context shape is known.
fn middleware_builder(procedure: &ProcedureMetadata, scan: &ScanOutput) -> Option<MiddlewareBuilder> {
    let name = procedure.middlewares().next()?;
    let Some(middleware) = scan.middleware(name) else {
        debug!(middleware = name, procedure = %procedure.name, "Middleware not found in scan");
        return None;
    };
    let Some(shape) = find_context_output_shape(&middleware.context_type) else {
        debug!(middleware = name, "Middleware has no context output shape");
        return None;
    };
    Some(MiddlewareBuilder {
        name: middleware.name.clone(),
        builder: format!("{}Procedure", lower_first(&middleware.name)),
        shape,
    })
}

/// Mount key of a router: its alias, or the class name with a lowercase first letter.
pub fn router_key(router: &RouterMetadata) -> String {
    match &router.alias {
        Some(alias) if !alias.is_empty() => alias.clone(),
        _ => lower_first(&router.name),
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Write the generated module to `path`.
///
/// An existing file is left alone unless `force` is set. Returns whether the
/// file was written.
pub fn write_app_router(path: &Path, content: &str, force: bool) -> anyhow::Result<bool> {
    if path.exists() && !force {
        println!("⚠️  Skipping existing app router: {path:?} (use --force to overwrite)");
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory for {}", path.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "Wrote app router");
    println!("✅ Generated app router: {path:?}");
    Ok(true)
}

/// Load the source tree at `root`, scan it, and generate its app router.
pub fn generate_from_root(root: &Path, config: &GeneratorConfig) -> anyhow::Result<String> {
    let project = Project::load(root)
        .with_context(|| format!("Failed to load TypeScript sources from {}", root.display()))?;
    let scan = crate::scan::scan_project(&project);
    if scan.routers.is_empty() {
        warn!(root = %root.display(), "No @Router classes found");
    }
    generate_app_router(&project, &scan, config)
}

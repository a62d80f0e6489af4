//! # trpcgen
//!
//! **trpcgen** generates a single, self-contained tRPC app router module from
//! decorated TypeScript controller classes, inlining every schema the
//! controllers reference across files.
//!
//! ## Overview
//!
//! Router classes declare procedures with decorators:
//!
//! ```typescript
//! import { userSchema } from './user.schema';
//!
//! @Router({ alias: 'users' })
//! export class UserRouter {
//!   @Query({ input: z.object({ id: z.string() }), output: userSchema })
//!   getUserById(@Input('id') id: string) { ... }
//! }
//! ```
//!
//! The generated module has to compile on its own, so `userSchema` cannot stay
//! a reference to another file. trpcgen resolves it through the imports and
//! inlines its definition:
//!
//! ```text
//! users: t.router({
//!   getUserById: publicProcedure.input(z.object({ id: z.string() })).output(z.object({ ... })).query(async () => "PLACEHOLDER_DO_NOT_REMOVE" as any),
//! }),
//! ```
//!
//! ## Architecture
//!
//! - **[`source`]** - TypeScript parsing (tree-sitter), declarations, imports and import resolution
//! - **[`flatten`]** - Inlines schema references into self-contained expressions
//! - **[`context`]** - Extracts the context output shape of a middleware
//! - **[`procedure`]** - Decorator metadata and procedure stub synthesis
//! - **[`scan`]** - Finds `@Router` classes and middlewares
//! - **[`generator`]** - Assembles the app router module with Askama
//! - **[`config`]** - `trpcgen.toml` generator settings
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `trpcgen` command line
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(trpcgen generate)
//!     participant Project as source::Project
//!     participant Scan as scan::scan_project
//!     participant Flatten as flatten::Flattener
//!     participant Stub as procedure::synthesize_procedure
//!     participant Template as generator::templates
//!
//!     CLI->>Project: Project::load(root)
//!     Project-->>CLI: parsed source units
//!     CLI->>Scan: scan_project(&project)
//!     Scan-->>CLI: routers, procedures, middlewares
//!     loop every router
//!         CLI->>Project: import_map(router unit)
//!         loop every decorator argument
//!             CLI->>Flatten: flatten_snippet(argument, unit)
//!             Flatten-->>CLI: self-contained expression
//!         end
//!         CLI->>Stub: synthesize_procedure(metadata, options)
//!         Stub-->>CLI: procedure definition
//!     end
//!     CLI->>Template: render_app_router(data)
//!     Template-->>CLI: server.ts
//! ```
//!
//! ## Programmatic Usage
//!
//! ```rust
//! use trpcgen::config::GeneratorConfig;
//! use trpcgen::generator::generate_app_router;
//! use trpcgen::scan::scan_project;
//! use trpcgen::source::Project;
//!
//! # fn main() -> anyhow::Result<()> {
//! let project = Project::from_sources([
//!     ("user.schema.ts", "export const userSchema = z.object({ id: z.string() });"),
//!     (
//!         "user.router.ts",
//!         "import { userSchema } from './user.schema';\n\
//!          @Router()\n\
//!          export class UserRouter {\n\
//!            @Query({ output: userSchema })\n\
//!            me() {}\n\
//!          }",
//!     ),
//! ])?;
//! let scan = scan_project(&project);
//! let module = generate_app_router(&project, &scan, &GeneratorConfig::default())?;
//! assert!(module.contains("me: publicProcedure.output(z.object({ id: z.string() }))"));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod flatten;
pub mod generator;
pub mod logging;
pub mod procedure;
pub mod scan;
pub mod source;

pub use context::find_context_output_shape;
pub use flatten::{flatten, FlattenError, FlattenOptions, Flattener};
pub use procedure::{
    synthesize_procedure, DecoratorKind, DecoratorMetadata, ProcedureMetadata, StubOptions,
};
pub use scan::{scan_project, scan_unit, MiddlewareMetadata, RouterMetadata, ScanOutput};
pub use source::{ImportBinding, ImportResolutionMap, Project, Snippet, SourceUnit};

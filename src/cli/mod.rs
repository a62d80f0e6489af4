//! # CLI Module
//!
//! Command-line interface of the `trpcgen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Scan a source tree and write the app router module:
//!
//! ```bash
//! trpcgen generate --root src --output src/@generated/server.ts
//! ```
//!
//! Options:
//! - `--root <DIR>` - Root of the TypeScript sources (default: `.`)
//! - `--output <FILE>` - Output file (default: `<root>/@generated/server.ts`)
//! - `--config <FILE>` - Generator config (default: `<root>/trpcgen.toml`)
//! - `--force` - Overwrite an existing output file
//! - `--dry-run` - Print the module instead of writing it
//!
//! ### `scan`
//!
//! Print the discovered routers, procedures and middlewares as JSON:
//!
//! ```bash
//! trpcgen scan --root src --pretty
//! ```
//!
//! ### `flatten`
//!
//! Flatten one expression, or one declaration, as seen from a file:
//!
//! ```bash
//! trpcgen flatten --root src --file user/user.router.ts 'userSchema.optional()'
//! trpcgen flatten --root src --file user/user.schema.ts --declaration userSchema
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};

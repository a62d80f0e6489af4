use crate::config::load_or_default;
use crate::flatten::Flattener;
use crate::generator::{generate_from_root, write_app_router};
use crate::scan::scan_project;
use crate::source::{normalize_path, Project, Snippet};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Command-line interface for trpcgen
///
/// Generates a self-contained tRPC app router from decorated TypeScript
/// controllers.
#[derive(Parser, Debug)]
#[command(name = "trpcgen")]
#[command(about = "tRPC app router generator", long_about = None, version)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the app router module from a source tree
    Generate {
        /// Root of the TypeScript source tree
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Output file (default: <root>/@generated/server.ts, or `output` from trpcgen.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to the generator config (default: <root>/trpcgen.toml when present)
        #[arg(short, long, env = "TRPCGEN_CONFIG")]
        config: Option<PathBuf>,

        /// Overwrite an existing output file
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Print the generated module instead of writing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print discovered routers and middlewares as JSON
    Scan {
        /// Root of the TypeScript source tree
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Flatten a schema expression or declaration as seen from one file
    Flatten {
        /// Root of the TypeScript source tree
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// File whose declarations and imports are in scope, relative to the root
        #[arg(long)]
        file: PathBuf,

        /// Expression to flatten
        #[arg(conflicts_with = "declaration", required_unless_present = "declaration")]
        expression: Option<String>,

        /// Flatten the initializer of this top-level declaration instead
        #[arg(short, long)]
        declaration: Option<String>,

        /// Path to the generator config (default: <root>/trpcgen.toml when present)
        #[arg(short, long, env = "TRPCGEN_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns an error if:
/// - The source tree or config cannot be read
/// - A schema reference chain is cyclic or too deep
/// - The output file cannot be written
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            root,
            output,
            config,
            force,
            dry_run,
        } => {
            let config = load_or_default(config.as_deref(), &root)?;
            let rendered = generate_from_root(&root, &config)?;
            if dry_run {
                print!("{rendered}");
                return Ok(());
            }
            let output = output.unwrap_or_else(|| root.join(&config.output));
            write_app_router(&output, &rendered, force)?;
            Ok(())
        }
        Commands::Scan { root, pretty } => {
            let project = load_project(&root)?;
            let scan = scan_project(&project);
            let json = if pretty {
                serde_json::to_string_pretty(&scan)?
            } else {
                serde_json::to_string(&scan)?
            };
            println!("{json}");
            Ok(())
        }
        Commands::Flatten {
            root,
            file,
            expression,
            declaration,
            config,
        } => {
            let config = load_or_default(config.as_deref(), &root)?;
            let project = load_project(&root)?;
            let key = normalize_path(&file.to_string_lossy());
            let Some(unit) = project.unit(&key) else {
                bail!("{} is not a TypeScript file under {}", file.display(), root.display());
            };
            let imports = project.import_map(unit);
            let flattener = Flattener::with_options(&imports, config.flatten_options());

            let flattened = match (expression, declaration) {
                (_, Some(name)) => flattener
                    .flatten_declaration(&name, unit)?
                    .with_context(|| format!("No declaration with an initializer named '{name}' in {key}"))?,
                (Some(expression), None) => {
                    let snippet = Snippet::parse(&expression)?;
                    flattener.flatten_snippet(&snippet, unit)?
                }
                (None, None) => bail!("Either an expression or --declaration is required"),
            };
            println!("{flattened}");
            Ok(())
        }
    }
}

fn load_project(root: &Path) -> anyhow::Result<Project> {
    Project::load(root)
        .with_context(|| format!("Failed to load TypeScript sources from {}", root.display()))
}

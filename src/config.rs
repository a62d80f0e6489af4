//! Generator configuration
//!
//! Projects can tune code generation with a `trpcgen.toml` file at the root of
//! the scanned source tree. Every field is optional.
//!
//! ```toml
//! builder_roots = ["z"]
//! procedure_builder = "publicProcedure"
//! max_depth = 256
//! schema_import = "zod"
//! output = "@generated/server.ts"
//! ```

use crate::flatten::{FlattenOptions, DEFAULT_BUILDER_ROOTS, DEFAULT_MAX_DEPTH};
use crate::procedure::{StubOptions, DEFAULT_PROCEDURE_BUILDER, PLACEHOLDER_IMPLEMENTATION};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the source root
pub const CONFIG_FILE_NAME: &str = "trpcgen.toml";

/// Output path used when neither the CLI nor the config names one
pub const DEFAULT_OUTPUT: &str = "@generated/server.ts";

/// Code generation settings loaded from `trpcgen.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Identifiers naming the schema builder namespace; never inlined
    pub builder_roots: Vec<String>,
    /// Builder every procedure chains from when no middleware applies
    pub procedure_builder: String,
    /// Procedure body emitted into every stub
    pub placeholder: String,
    /// Maximum identifier resolution depth while flattening
    pub max_depth: usize,
    /// Module the schema builder is imported from in the generated file
    pub schema_import: String,
    /// Output path, relative to the source root
    pub output: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            builder_roots: DEFAULT_BUILDER_ROOTS.iter().map(|s| s.to_string()).collect(),
            procedure_builder: DEFAULT_PROCEDURE_BUILDER.to_string(),
            placeholder: PLACEHOLDER_IMPLEMENTATION.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            schema_import: "zod".to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl GeneratorConfig {
    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            builder_roots: self.builder_roots.clone(),
            max_depth: self.max_depth,
        }
    }

    /// Stub options rooted at `builder_root`, or the configured procedure builder.
    pub fn stub_options(&self, builder_root: Option<&str>) -> StubOptions {
        StubOptions {
            builder_root: builder_root
                .unwrap_or(&self.procedure_builder)
                .to_string(),
            placeholder: self.placeholder.clone(),
        }
    }
}

/// Load the generator configuration from a TOML file.
///
/// Returns `Ok(None)` when the file does not exist, and an error when it
/// exists but cannot be read or parsed.
pub fn load_config(config_path: &Path) -> anyhow::Result<Option<GeneratorConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read generator config: {}", config_path.display()))?;

    let config: GeneratorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse generator config: {}", config_path.display()))?;

    Ok(Some(config))
}

/// Resolve the config path.
///
/// Priority:
/// 1. Explicitly provided path (via CLI)
/// 2. `trpcgen.toml` in the source root
/// 3. None (defaults)
pub fn resolve_config_path(explicit_path: Option<&Path>, root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    let detected = root.join(CONFIG_FILE_NAME);
    detected.exists().then_some(detected)
}

/// Resolve and load the configuration, falling back to defaults.
///
/// An explicitly named file that does not exist is an error.
pub fn load_or_default(explicit_path: Option<&Path>, root: &Path) -> anyhow::Result<GeneratorConfig> {
    let Some(path) = resolve_config_path(explicit_path, root) else {
        return Ok(GeneratorConfig::default());
    };
    match load_config(&path)? {
        Some(config) => {
            tracing::info!(path = %path.display(), "Loaded generator config");
            Ok(config)
        }
        None => anyhow::bail!("Generator config not found: {}", path.display()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.builder_roots, vec!["z".to_string()]);
        assert_eq!(config.flatten_options(), FlattenOptions::default());
        assert_eq!(config.stub_options(None), StubOptions::default());
        assert_eq!(config.stub_options(Some("authProcedure")).builder_root, "authProcedure");
        assert_eq!(config.output, PathBuf::from("@generated/server.ts"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GeneratorConfig =
            toml::from_str("builder_roots = [\"z\", \"v\"]\nmax_depth = 8\n").unwrap();
        assert_eq!(config.builder_roots, vec!["z", "v"]);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.procedure_builder, "publicProcedure");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(toml::from_str::<GeneratorConfig>("builder_root = \"z\"").is_err());
    }

    #[test]
    fn test_load_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config_path(None, dir.path()).is_none());
        assert_eq!(load_or_default(None, dir.path()).unwrap(), GeneratorConfig::default());
        assert!(load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap().is_none());

        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "procedure_builder = \"baseProcedure\"\n").unwrap();
        assert_eq!(resolve_config_path(None, dir.path()), Some(path.clone()));
        let config = load_or_default(None, dir.path()).unwrap();
        assert_eq!(config.procedure_builder, "baseProcedure");

        let missing = dir.path().join("missing.toml");
        assert!(load_or_default(Some(&missing), dir.path()).is_err());

        std::fs::write(&path, "max_depth = \"deep\"").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse generator config"));
    }
}

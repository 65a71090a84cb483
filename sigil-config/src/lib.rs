//! Shared configuration loader for the sigil toolchain.
//!
//! `defaults/sigil.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`SigilConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use sigil_parser::CompileOptions;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/sigil.default.toml");

/// Top-level configuration consumed by sigil applications.
#[derive(Debug, Clone, Deserialize)]
pub struct SigilConfig {
    pub compile: CompileConfig,
    pub debug: DebugConfig,
    pub output: OutputConfig,
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompileConfig {
    pub body_only: bool,
}

/// Which debug dumps to print and how.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    pub show_tokens: bool,
    pub show_ast: bool,
    pub show_parse: bool,
    pub dump_format: DumpFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DumpFormat {
    /// The compiler's own line oriented dumps
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub out_dir: String,
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub index: String,
}

impl SigilConfig {
    /// Compile options for `document`
    pub fn compile_options(&self, document: &str) -> CompileOptions {
        CompileOptions {
            body_only: self.compile.body_only,
            show_tokens: self.debug.show_tokens,
            show_ast: self.debug.show_ast,
            show_parse: self.debug.show_parse,
            document: document.to_string(),
            extension: self.output.extension.clone(),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<SigilConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<SigilConfig, ConfigError> {
    Loader::new().build()
}

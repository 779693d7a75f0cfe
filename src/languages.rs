//! Language configuration for compilation and execution

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::JudgeError;

/// Build/run recipe for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Name of the source file the code is written to (e.g., "main.cpp")
    pub source_file: String,
    /// Compile command (None for interpreted languages)
    pub compile_command: Option<String>,
    /// Run command
    pub run_command: String,
}

impl LanguageConfig {
    /// Whether this language has a compile step
    pub fn needs_compilation(&self) -> bool {
        self.compile_command.is_some()
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Registry of supported languages, fixed after construction.
///
/// Lookups are case-insensitive and alias-aware ("py" resolves to the
/// python recipe). Shared read-only across all judge workers.
#[derive(Debug)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageConfig>,
}

impl LanguageRegistry {
    /// Build the registry from the TOML table shipped with the crate
    pub fn from_embedded() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml(content)
    }

    /// Build the registry from an operator-provided TOML file
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read language config {}",
                path.as_ref().display()
            )
        })?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> =
            toml::from_str(content).context("Failed to parse language config")?;

        let mut languages = HashMap::new();

        for (name, raw) in raw_configs {
            let config = LanguageConfig {
                source_file: raw.source_file,
                compile_command: raw.compile_command,
                run_command: raw.run_command,
            };

            for alias in raw.aliases {
                languages.insert(alias.to_lowercase(), config.clone());
            }
            languages.insert(name.to_lowercase(), config);
        }

        Ok(Self { languages })
    }

    /// Look up the recipe for a language
    pub fn config_for(&self, language: &str) -> Result<&LanguageConfig, JudgeError> {
        self.languages
            .get(&language.to_lowercase())
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language.to_string()))
    }

    /// All registered names, aliases included
    pub fn supported_languages(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }
}

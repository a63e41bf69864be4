//! Configuration loading and fail-fast validation.
//!
//! The config file is JSON with camelCase keys. Every section is
//! optional; missing fields fall back to defaults, and anything invalid
//! (bad naming segments, empty output directory, zero workers) is
//! rejected at load time rather than surfacing mid-run.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::llm::{ModelConfig, ModelConfigFile};
use crate::output::{ArtifactNaming, CollisionPolicy};

/// Default config file name searched in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "docweaver.json";

const DEFAULT_OUTPUT_DIRECTORY: &str = "generated-docs";
const DEFAULT_MAX_WORKERS: usize = 4;

/// Analysis section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    /// Whether private elements are inventoried by default. A per-run
    /// override takes precedence over this value.
    pub include_private_members: bool,
    /// Glob patterns for paths to skip (e.g., `**/target/**`).
    pub exclude_patterns: Vec<String>,
    /// Upper bound on concurrent LLM calls during generation.
    pub max_workers: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            include_private_members: false,
            exclude_patterns: Vec::new(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl AnalysisSettings {
    /// Compile the exclude patterns into a matcher.
    pub fn exclude_globs(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

/// Output section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputSettings {
    pub output_directory: PathBuf,
    pub collision_policy: CollisionPolicy,
    pub naming: ArtifactNaming,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            collision_policy: CollisionPolicy::Overwrite,
            naming: ArtifactNaming::default(),
        }
    }
}

/// Raw config file shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    llm_models: Vec<ModelConfigFile>,
    analysis_settings: AnalysisSettings,
    output_settings: OutputSettings,
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct DocweaverConfig {
    pub models: Vec<ModelConfig>,
    pub analysis: AnalysisSettings,
    pub output: OutputSettings,
}

impl DocweaverConfig {
    /// Parse and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let raw: ConfigFile = serde_json::from_str(&content)?;
        Self::from_raw(raw)
    }

    /// Built-in defaults, used when no config file is present.
    pub fn default_config() -> Self {
        Self::from_raw(ConfigFile::default()).expect("default config is valid")
    }

    fn from_raw(raw: ConfigFile) -> anyhow::Result<Self> {
        let config = Self {
            models: raw
                .llm_models
                .into_iter()
                .map(ModelConfig::from_file_entry)
                .collect(),
            analysis: raw.analysis_settings,
            output: raw.output_settings,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.output.output_directory.as_os_str().is_empty() {
            anyhow::bail!("output directory must not be empty");
        }
        if self.analysis.max_workers == 0 {
            anyhow::bail!("maxWorkers must be at least 1");
        }
        self.output.naming.validate()?;
        self.analysis.exclude_globs()?;
        Ok(())
    }

    /// First configured model, or the built-in local default.
    pub fn primary_model(&self) -> ModelConfig {
        self.models.first().cloned().unwrap_or_default()
    }
}

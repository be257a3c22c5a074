pub mod cli;
pub mod toml_config;

use crate::core::dedup::{MergeOptions, StalePolicy};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_OUTPUT_PATH: &str = ".";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "record-dedup")]
#[command(about = "Merge records sharing an identifier or email and write an audit trail")]
pub struct CliConfig {
    /// Input JSON file: an object mapping group names to arrays of records
    pub input: String,

    /// Directory the per-group artifacts are written to
    #[arg(long)]
    pub output_path: Option<String>,

    /// Optional TOML configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Handling of records older than the record they match
    #[arg(long, value_enum)]
    pub stale_policy: Option<StalePolicy>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Layers command-line flags over the TOML file (if any) and defaults.
    pub fn resolve(&self) -> Result<RunConfig> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        file.validate()?;
        Ok(RunConfig::layered(
            self.input.clone(),
            self.output_path.clone(),
            self.stale_policy,
            file,
        ))
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input_path: String,
    pub output_path: String,
    pub merge: MergeOptions,
}

impl RunConfig {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            merge: MergeOptions::default(),
        }
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.merge.stale_policy = stale_policy;
        self
    }

    /// Explicit values win over the file, the file wins over defaults.
    pub fn layered(
        input_path: String,
        output_path: Option<String>,
        stale_policy: Option<StalePolicy>,
        file: TomlConfig,
    ) -> Self {
        let mut merge = file.merge_options();
        if let Some(policy) = stale_policy {
            merge.stale_policy = policy;
        }
        Self {
            input_path,
            output_path: output_path
                .or(file.output.path)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            merge,
        }
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn merge_options(&self) -> MergeOptions {
        self.merge.clone()
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input_path)?;
        validation::validate_path("output_path", &self.output_path)?;
        let fields = &self.merge.fields;
        validation::validate_non_empty_string("fields.identifier", &fields.identifier)?;
        validation::validate_non_empty_string("fields.email", &fields.email)?;
        validation::validate_non_empty_string("fields.entry_date", &fields.entry_date)?;
        validation::validate_distinct(
            "fields",
            &[
                fields.identifier.as_str(),
                fields.email.as_str(),
                fields.entry_date.as_str(),
            ],
        )
    }
}

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::utils::parser;
use cgdescribe::engine::config::{
    DescribeConfig, DescribeConfigBuilder, DescribeMode, DescriptorScope,
};
use cgdescribe::engine::table::OutputMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Defaults read from a TOML file; every key is optional and CLI arguments win.
///
/// ```toml
/// per-ml = false
/// distances = "1,20:2,19"
/// angles = "s0,s1"
/// keys = ["nt_length", "rog_fast"]
/// descriptor-scope = "all-multiloops"
/// csv = "features.csv"
/// mode = "a"
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialDescribeConfig {
    pub per_ml: Option<bool>,
    pub distances: Option<String>,
    pub angles: Option<String>,
    pub keys: Option<Vec<String>>,
    pub descriptor_scope: Option<DescriptorScope>,
    pub csv: Option<PathBuf>,
    pub mode: Option<String>,
}

/// Everything the `describe` command needs after merging file and CLI values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub describe: DescribeConfig,
    pub csv: Option<PathBuf>,
    pub mode: Option<OutputMode>,
    pub keys: Option<Vec<String>>,
}

impl PartialDescribeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from '{}'", path.display());
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| CliError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(self, cli: &Cli) -> Result<AppConfig> {
        // Mode is validated before anything else so a typo fails fast.
        let mode = cli
            .mode
            .as_deref()
            .or(self.mode.as_deref())
            .map(str::parse::<OutputMode>)
            .transpose()?;

        let mode_kind = if cli.per_ml || self.per_ml.unwrap_or(false) {
            DescribeMode::PerMultiloopSegment
        } else {
            DescribeMode::WholeStructure
        };

        let distances = match cli.distances.as_deref().or(self.distances.as_deref()) {
            Some(raw) => parser::parse_distance_pairs(raw)?,
            None => Vec::new(),
        };
        let angles = match cli.angles.as_deref().or(self.angles.as_deref()) {
            Some(raw) => parser::parse_angle_pairs(raw)?,
            None => Vec::new(),
        };

        let descriptor_scope = if cli.aggregate_descriptors {
            DescriptorScope::AllMultiloops
        } else {
            self.descriptor_scope.unwrap_or_default()
        };

        let describe = DescribeConfigBuilder::new()
            .mode(mode_kind)
            .distances(distances)
            .angles(angles)
            .descriptor_scope(descriptor_scope)
            .build()?;

        Ok(AppConfig {
            describe,
            csv: cli.csv.clone().or(self.csv),
            mode,
            keys: cli.keys.clone().or(self.keys),
        })
    }
}

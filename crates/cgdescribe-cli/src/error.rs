use crate::utils::parser::ParseError;
use cgdescribe::core::io::loader::LoadError;
use cgdescribe::engine::config::ConfigError;
use cgdescribe::engine::error::EngineError;
use cgdescribe::engine::table::TableError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to parse config file '{path}': {source}", path = path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid argument: {0}")]
    Argument(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

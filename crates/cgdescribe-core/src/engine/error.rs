use thiserror::Error;

use super::config::ConfigError;
use super::table::TableError;
use crate::core::models::coords::GeometryError;
use crate::core::models::graph::GraphError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Structure topology error: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },

    #[error("Geometry calculation failed ({}): {source}", .source.kind())]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Result table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Error occurred during describing {ordinal} cg {name}")]
    Structure {
        ordinal: String,
        name: String,
        #[source]
        source: Box<EngineError>,
    },
}

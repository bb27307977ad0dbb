use super::cg::{CgError, CgFile};
use super::dotbracket::{DotBracketError, DotBracketFile};
use super::traits::RnaFile;
use crate::core::models::rna::CoarseGrainRna;
use phf::{Map, phf_map};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnaFormat {
    CoarseGrain,
    DotBracket,
}

static EXTENSIONS: Map<&'static str, RnaFormat> = phf_map! {
    "cg" => RnaFormat::CoarseGrain,
    "coord" => RnaFormat::CoarseGrain,
    "fa" => RnaFormat::DotBracket,
    "fasta" => RnaFormat::DotBracket,
    "db" => RnaFormat::DotBracket,
    "dbn" => RnaFormat::DotBracket,
    "dotbracket" => RnaFormat::DotBracket,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid coarse-grained file '{}': {source}", .path.display())]
    CoarseGrain {
        path: PathBuf,
        #[source]
        source: CgError,
    },
    #[error("Invalid dot-bracket file '{}': {source}", .path.display())]
    DotBracket {
        path: PathBuf,
        #[source]
        source: DotBracketError,
    },
}

/// A structure together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedStructure {
    pub rna: CoarseGrainRna,
    pub filename: String,
}

impl RnaFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSIONS.get(extension.as_str()).copied()
    }

    /// Guesses the format of a file with an unknown extension from its records.
    pub fn sniff(content: &str) -> Self {
        let is_cg = content.lines().any(|line| {
            let first = line.split_whitespace().next();
            matches!(first, Some("define") | Some("connect") | Some("coord"))
        });
        if is_cg {
            RnaFormat::CoarseGrain
        } else {
            RnaFormat::DotBracket
        }
    }
}

/// Reads every structure in `path`, choosing the reader from the file extension and
/// falling back to content sniffing.
pub fn load_structures(path: &Path) -> Result<Vec<LoadedStructure>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = RnaFormat::from_extension(path).unwrap_or_else(|| {
        let guess = RnaFormat::sniff(&content);
        debug!("Unknown extension for '{}', reading it as {:?}.", path.display(), guess);
        guess
    });
    let default_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = Cursor::new(content.as_bytes());
    let structures = match format {
        RnaFormat::CoarseGrain => {
            CgFile::read_from(&mut reader, &default_name).map_err(|source| {
                LoadError::CoarseGrain {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        }
        RnaFormat::DotBracket => DotBracketFile::read_from(&mut reader, &default_name)
            .map_err(|source| LoadError::DotBracket {
                path: path.to_path_buf(),
                source,
            })?,
    };

    let filename = path.display().to_string();
    Ok(structures
        .into_iter()
        .map(|rna| LoadedStructure {
            rna,
            filename: filename.clone(),
        })
        .collect())
}

/// Loads all inputs in order, stopping at the first unreadable file.
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<LoadedStructure>, LoadError> {
    let mut loaded = Vec::new();
    for path in paths {
        loaded.extend(load_structures(path.as_ref())?);
    }
    Ok(loaded)
}

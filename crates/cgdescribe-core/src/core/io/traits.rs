use crate::core::models::rna::CoarseGrainRna;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading RNA structure file formats.
///
/// Implementors handle format-specific parsing and produce one or more coarse-grained
/// structures per file.
pub trait RnaFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads every structure contained in a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    /// * `default_name` - Name given to structures whose record does not carry one.
    ///
    /// # Return
    ///
    /// Returns the parsed structures in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(
        reader: &mut impl BufRead,
        default_name: &str,
    ) -> Result<Vec<CoarseGrainRna>, Self::Error>;

    /// Reads every structure from a file path, naming unnamed records after the file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CoarseGrainRna>, Self::Error> {
        let path = path.as_ref();
        let default_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, &default_name)
    }
}

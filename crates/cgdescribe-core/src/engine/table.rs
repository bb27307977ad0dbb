use super::features::{FeatureRow, FeatureValue};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Column that identifies a row and survives every column filter.
pub const NAME_COLUMN: &str = "name";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Row {row} has columns [{found}], expected [{expected}]")]
    SchemaMismatch {
        row: usize,
        expected: String,
        found: String,
    },
    #[error("File {} exists. Use --mode to overwrite or append", .0.display())]
    FileExists(PathBuf),
    #[error("Mode must be one of 'a' and 'o', got '{0}'")]
    InvalidMode(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// How an existing CSV target is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Overwrite,
    Append,
}

impl FromStr for OutputMode {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o" => Ok(OutputMode::Overwrite),
            "a" => Ok(OutputMode::Append),
            other => Err(TableError::InvalidMode(other.to_string())),
        }
    }
}

/// Rows accumulated over a run, all sharing the column layout of the first row.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: FeatureRow) -> Result<(), TableError> {
        if self.rows.is_empty() {
            self.columns = row.keys().map(str::to_string).collect();
        } else if !row.keys().eq(self.columns.iter().map(String::as_str)) {
            return Err(TableError::SchemaMismatch {
                row: self.rows.len(),
                expected: self.columns.join(", "),
                found: row.keys().collect::<Vec<_>>().join(", "),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Keeps only the listed columns plus the name column, in their original order.
    /// Names that match no column are ignored.
    pub fn retain_columns<S: AsRef<str>>(&mut self, keys: &[S]) {
        let keep = |column: &str| column == NAME_COLUMN || keys.iter().any(|k| k.as_ref() == column);
        self.columns.retain(|c| keep(c));
        for row in &mut self.rows {
            row.retain(keep);
        }
    }

    /// Writes the table as CSV.
    ///
    /// Without a mode an existing `path` is left untouched and reported as an error. The
    /// header is written on overwrite, and on append only when the target is missing or empty.
    /// A table without columns leaves the target as it is.
    pub fn write_csv(&self, path: &Path, mode: Option<OutputMode>) -> Result<(), TableError> {
        let existing_len = match path.metadata() {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        if mode.is_none() && existing_len.is_some() {
            return Err(TableError::FileExists(path.to_path_buf()));
        }
        if self.columns.is_empty() {
            warn!("No rows to write, '{}' is left unchanged.", path.display());
            return Ok(());
        }

        let (file, write_header) = match (mode, existing_len) {
            (Some(OutputMode::Append), Some(len)) => {
                let file = OpenOptions::new().append(true).open(path)?;
                (file, len == 0)
            }
            _ => (File::create(path)?, true),
        };
        debug!(
            "Writing {} rows to '{}' (header: {}).",
            self.rows.len(),
            path.display(),
            write_header
        );

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if write_header {
            writer.write_record(std::iter::once("").chain(self.columns.iter().map(String::as_str)))?;
        }
        for (index, row) in self.rows.iter().enumerate() {
            writer.write_record(
                std::iter::once(index.to_string()).chain(row.values().map(FeatureValue::to_csv_field)),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Renders the full table as right-aligned text columns, preceded by the row number.
    pub fn render_text(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let header: Vec<String> = std::iter::once(String::new())
            .chain(self.columns.iter().cloned())
            .collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                std::iter::once(index.to_string())
                    .chain(row.values().map(FeatureValue::to_string))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for line in &body {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = format_line(&header);
        out.push('\n');
        for line in &body {
            out.push_str(&format_line(line));
            out.push('\n');
        }
        out
    }
}

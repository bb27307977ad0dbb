use crate::core::io::traits::RnaFile;
use crate::core::models::decomposition::decompose;
use crate::core::models::graph::GraphError;
use crate::core::models::rna::CoarseGrainRna;
use phf::{Map, phf_map};
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

/// Closing bracket to its opening counterpart. Each bracket family is matched
/// independently, so crossing families encode pseudoknots.
static BRACKET_PAIRS: Map<char, char> = phf_map! {
    ')' => '(',
    ']' => '[',
    '}' => '{',
    '>' => '<',
};

const UNPAIRED: char = '.';

#[derive(Debug, Error)]
pub enum DotBracketError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: DotBracketParseErrorKind,
    },
    #[error("Invalid secondary structure '{name}': {source}")]
    Graph {
        name: String,
        #[source]
        source: GraphError,
    },
    #[error("File contains no structure records")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DotBracketParseErrorKind {
    #[error("Unexpected character '{character}' at position {position}")]
    InvalidCharacter { position: usize, character: char },
    #[error("Closing '{bracket}' at position {position} has no opening partner")]
    UnbalancedClose { position: usize, bracket: char },
    #[error("Opening '{bracket}' at position {position} is never closed")]
    UnclosedOpen { position: usize, bracket: char },
    #[error("Sequence has {sequence} nucleotides but the structure has {structure}")]
    LengthMismatch { sequence: usize, structure: usize },
    #[error("Record '{0}' has no structure line")]
    MissingStructure(String),
}

fn is_structure_char(c: char) -> bool {
    c == UNPAIRED || BRACKET_PAIRS.contains_key(&c) || BRACKET_PAIRS.values().any(|&o| o == c)
}

/// Converts a dot-bracket string into a 1-based pair table (index 0 unused).
pub fn parse_pair_table(structure: &str) -> Result<Vec<Option<usize>>, DotBracketParseErrorKind> {
    let length = structure.chars().count();
    let mut table = vec![None; length + 1];
    let mut open: Vec<(char, Vec<usize>)> = BRACKET_PAIRS
        .values()
        .map(|&opening| (opening, Vec::new()))
        .collect();

    for (idx, c) in structure.chars().enumerate() {
        let position = idx + 1;
        if c == UNPAIRED {
            continue;
        }
        if let Some(opening) = BRACKET_PAIRS.get(&c) {
            let stack = open
                .iter_mut()
                .find(|(o, _)| o == opening)
                .map(|(_, stack)| stack);
            let partner = stack
                .and_then(|s| s.pop())
                .ok_or(DotBracketParseErrorKind::UnbalancedClose {
                    position,
                    bracket: c,
                })?;
            table[position] = Some(partner);
            table[partner] = Some(position);
        } else if let Some((_, stack)) = open.iter_mut().find(|(o, _)| *o == c) {
            stack.push(position);
        } else {
            return Err(DotBracketParseErrorKind::InvalidCharacter {
                position,
                character: c,
            });
        }
    }

    if let Some((bracket, position)) = open
        .iter()
        .filter_map(|(o, stack)| stack.first().map(|p| (*o, *p)))
        .min_by_key(|(_, p)| *p)
    {
        return Err(DotBracketParseErrorKind::UnclosedOpen { position, bracket });
    }
    Ok(table)
}

#[derive(Debug, Default)]
struct PendingRecord {
    name: Option<String>,
    sequence: String,
    line: usize,
}

/// Reader for dot-bracket files: FASTA-like records of an optional `>name` header, an
/// optional sequence and a structure line. Structures read this way carry no 3D data.
pub struct DotBracketFile;

impl DotBracketFile {
    fn finish(
        record: PendingRecord,
        structure: &str,
        line: usize,
        default_name: &str,
        index: usize,
    ) -> Result<CoarseGrainRna, DotBracketError> {
        let table = parse_pair_table(structure)
            .map_err(|kind| DotBracketError::Parse { line, kind })?;
        let length = table.len() - 1;
        let sequence = if record.sequence.is_empty() {
            "N".repeat(length)
        } else {
            record.sequence
        };
        let sequence_length = sequence.chars().count();
        if sequence_length != length {
            return Err(DotBracketError::Parse {
                line,
                kind: DotBracketParseErrorKind::LengthMismatch {
                    sequence: sequence_length,
                    structure: length,
                },
            });
        }

        let name = record.name.unwrap_or_else(|| match index {
            0 => default_name.to_string(),
            _ => format!("{}_{}", default_name, index + 1),
        });
        let graph = decompose(&sequence, &table).map_err(|source| DotBracketError::Graph {
            name: name.clone(),
            source,
        })?;
        debug!(
            "Parsed dot-bracket record '{}' with {} elements.",
            name,
            graph.len()
        );
        Ok(CoarseGrainRna::new(name, graph))
    }
}

impl RnaFile for DotBracketFile {
    type Error = DotBracketError;

    fn read_from(
        reader: &mut impl BufRead,
        default_name: &str,
    ) -> Result<Vec<CoarseGrainRna>, Self::Error> {
        let mut structures = Vec::new();
        let mut pending: Option<PendingRecord> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('>') {
                if let Some(record) = pending.take() {
                    return Err(DotBracketError::Parse {
                        line: record.line,
                        kind: DotBracketParseErrorKind::MissingStructure(
                            record.name.unwrap_or_default(),
                        ),
                    });
                }
                pending = Some(PendingRecord {
                    name: Some(header.trim().to_string()),
                    sequence: String::new(),
                    line: line_num,
                });
                continue;
            }

            let first = trimmed.chars().next().unwrap_or(UNPAIRED);
            if is_structure_char(first) {
                // trailing annotations such as free energies follow the structure
                let structure = trimmed.split_whitespace().next().unwrap_or_default();
                let record = pending.take().unwrap_or_default();
                let index = structures.len();
                structures.push(Self::finish(
                    record,
                    structure,
                    line_num,
                    default_name,
                    index,
                )?);
                continue;
            }

            if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_alphabetic()) {
                return Err(DotBracketError::Parse {
                    line: line_num,
                    kind: DotBracketParseErrorKind::InvalidCharacter {
                        position: trimmed.find(bad).map_or(0, |p| p + 1),
                        character: bad,
                    },
                });
            }
            let record = pending.get_or_insert_with(|| PendingRecord {
                line: line_num,
                ..Default::default()
            });
            record.sequence.push_str(&trimmed.to_ascii_uppercase());
        }

        if let Some(record) = pending {
            return Err(DotBracketError::Parse {
                line: record.line,
                kind: DotBracketParseErrorKind::MissingStructure(record.name.unwrap_or_default()),
            });
        }
        if structures.is_empty() {
            return Err(DotBracketError::Empty);
        }
        Ok(structures)
    }
}

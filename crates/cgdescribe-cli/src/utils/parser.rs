use cgdescribe::engine::config::{ElementPair, NucleotidePair};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid pair '{pair}' in '{input}'. Expected two comma-separated entries (e.g., '1,20').")]
    MalformedPair { input: String, pair: String },

    #[error("Invalid nucleotide number '{value}' in '{input}'. Expected a positive integer.")]
    InvalidNucleotide { input: String, value: String },

    #[error("Component '{component}' cannot be empty in pair list '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// Splits `"a,b:c,d"` into `[("a", "b"), ("c", "d")]`, trimming whitespace.
fn split_pairs(input: &str) -> Result<Vec<(&str, &str)>, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "pair list",
            input: input.to_string(),
        });
    }
    input
        .split(':')
        .map(|pair| {
            let parts: Vec<&str> = pair.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [first, second] if !first.is_empty() && !second.is_empty() => Ok((*first, *second)),
                _ => Err(ParseError::MalformedPair {
                    input: input.to_string(),
                    pair: pair.to_string(),
                }),
            }
        })
        .collect()
}

pub fn parse_distance_pairs(input: &str) -> Result<Vec<NucleotidePair>, ParseError> {
    let parse_nt = |value: &str| {
        value
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidNucleotide {
                input: input.to_string(),
                value: value.to_string(),
            })
    };
    split_pairs(input)?
        .into_iter()
        .map(|(from, to)| Ok(NucleotidePair::new(parse_nt(from)?, parse_nt(to)?)))
        .collect()
}

/// Element names stay unvalidated here; a name that matches nothing in a structure
/// only yields `NaN` for that structure.
pub fn parse_angle_pairs(input: &str) -> Result<Vec<ElementPair>, ParseError> {
    Ok(split_pairs(input)?
        .into_iter()
        .map(|(first, second)| ElementPair::new(first, second))
        .collect())
}

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Nucleotide numbers start at 1, got 0 in distance pair {0}")]
    ZeroNucleotide(NucleotidePair),
    #[error("Angle pair {0} names an empty element")]
    EmptyElement(ElementPair),
}

/// Two nucleotides (1-based) whose virtual-residue distance is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NucleotidePair {
    pub from: usize,
    pub to: usize,
}

impl NucleotidePair {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn column(&self) -> String {
        format!("distance_{}_{}", self.from, self.to)
    }
}

impl fmt::Display for NucleotidePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.from, self.to)
    }
}

/// Two element names (e.g. `s0`, `m1`) whose direction vectors are compared.
///
/// Names are kept verbatim; unknown names only fail when the angle is computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPair {
    pub first: String,
    pub second: String,
}

impl ElementPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn column(&self) -> String {
        format!("angle_{}_{}", self.first, self.second)
    }
}

impl fmt::Display for ElementPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescribeMode {
    /// One row per structure.
    #[default]
    WholeStructure,
    /// One row per multiloop segment.
    PerMultiloopSegment,
}

/// Which multiloops feed the `open_mls`, `pseudoknots` and `regular_mls` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorScope {
    /// Only the last multiloop found in the structure.
    #[default]
    LastMultiloop,
    /// Every multiloop of the structure.
    AllMultiloops,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescribeConfig {
    pub mode: DescribeMode,
    pub distances: Vec<NucleotidePair>,
    pub angles: Vec<ElementPair>,
    pub descriptor_scope: DescriptorScope,
}

#[derive(Default)]
pub struct DescribeConfigBuilder {
    mode: Option<DescribeMode>,
    distances: Vec<NucleotidePair>,
    angles: Vec<ElementPair>,
    descriptor_scope: Option<DescriptorScope>,
}

impl DescribeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: DescribeMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn distances(mut self, pairs: Vec<NucleotidePair>) -> Self {
        self.distances = pairs;
        self
    }
    pub fn angles(mut self, pairs: Vec<ElementPair>) -> Self {
        self.angles = pairs;
        self
    }
    pub fn descriptor_scope(mut self, scope: DescriptorScope) -> Self {
        self.descriptor_scope = Some(scope);
        self
    }

    pub fn build(self) -> Result<DescribeConfig, ConfigError> {
        if let Some(pair) = self.distances.iter().find(|p| p.from == 0 || p.to == 0) {
            return Err(ConfigError::ZeroNucleotide(*pair));
        }
        if let Some(pair) = self
            .angles
            .iter()
            .find(|p| p.first.is_empty() || p.second.is_empty())
        {
            return Err(ConfigError::EmptyElement(pair.clone()));
        }
        Ok(DescribeConfig {
            mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
            distances: self.distances,
            angles: self.angles,
            descriptor_scope: self.descriptor_scope.unwrap_or_default(),
        })
    }
}

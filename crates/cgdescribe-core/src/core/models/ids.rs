use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of a coarse-grained RNA element, encoded by a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Stem,
    Multiloop,
    Interior,
    FivePrime,
    ThreePrime,
    Hairpin,
}

impl ElementKind {
    /// All kinds in the canonical `smifth` order used for per-kind counts.
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Stem,
        ElementKind::Multiloop,
        ElementKind::Interior,
        ElementKind::FivePrime,
        ElementKind::ThreePrime,
        ElementKind::Hairpin,
    ];

    pub fn code(self) -> char {
        match self {
            ElementKind::Stem => 's',
            ElementKind::Multiloop => 'm',
            ElementKind::Interior => 'i',
            ElementKind::FivePrime => 'f',
            ElementKind::ThreePrime => 't',
            ElementKind::Hairpin => 'h',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            's' => Some(ElementKind::Stem),
            'm' => Some(ElementKind::Multiloop),
            'i' => Some(ElementKind::Interior),
            'f' => Some(ElementKind::FivePrime),
            't' => Some(ElementKind::ThreePrime),
            'h' => Some(ElementKind::Hairpin),
            _ => None,
        }
    }

    pub fn is_stem(self) -> bool {
        self == ElementKind::Stem
    }

    /// Whether elements of this kind can take part in a multiloop walk.
    pub fn is_junction_kind(self) -> bool {
        matches!(
            self,
            ElementKind::Multiloop | ElementKind::FivePrime | ElementKind::ThreePrime
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Identifier of an element inside a bulge graph, e.g. `s0` or `m12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId {
    pub kind: ElementKind,
    pub index: usize,
}

impl ElementId {
    pub fn new(kind: ElementKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.code(), self.index)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid element identifier '{0}'. Expected a kind letter from 'smifth' followed by an index (e.g. 's0').")]
pub struct ParseElementIdError(pub String);

impl FromStr for ElementId {
    type Err = ParseElementIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let kind = chars
            .next()
            .and_then(ElementKind::from_code)
            .ok_or_else(|| ParseElementIdError(s.to_string()))?;
        let index = chars
            .as_str()
            .parse::<usize>()
            .map_err(|_| ParseElementIdError(s.to_string()))?;
        Ok(Self { kind, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_id_parses_and_displays() {
        let id: ElementId = "m12".parse().unwrap();
        assert_eq!(id, ElementId::new(ElementKind::Multiloop, 12));
        assert_eq!(id.to_string(), "m12");
    }

    #[test]
    fn element_id_rejects_unknown_kind_and_missing_index() {
        assert!("x0".parse::<ElementId>().is_err());
        assert!("s".parse::<ElementId>().is_err());
        assert!("".parse::<ElementId>().is_err());
        assert!("s-1".parse::<ElementId>().is_err());
    }

    #[test]
    fn kind_codes_round_trip_for_all_kinds() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_code(kind.code()), Some(kind));
        }
    }
}

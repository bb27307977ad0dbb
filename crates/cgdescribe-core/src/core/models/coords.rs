use super::graph::GraphError;
use super::ids::ElementId;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Structure '{0}' has no 3D coordinates")]
    Missing3d(String),

    #[error("No 3D coordinates for element {0}")]
    MissingCoordinates(ElementId),

    #[error("No twist vectors for stem {0}")]
    MissingTwist(ElementId),

    #[error("Structure has no stem positions to measure")]
    NoStemPositions,

    #[error("Unknown element '{0}'")]
    UnknownElement(String),

    #[error("Nucleotide {nt} is outside the sequence (length {length})")]
    NucleotideOutOfRange { nt: usize, length: usize },

    #[error("Nucleotide {0} is not part of a stem")]
    SingleStranded(usize),

    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Coarse classification of a [`GeometryError`], used when reporting failed metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryErrorKind {
    GeometryUnavailable,
    LookupFailed,
    DegenerateGeometry,
}

impl fmt::Display for GeometryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryErrorKind::GeometryUnavailable => "geometry-unavailable",
            GeometryErrorKind::LookupFailed => "lookup-failed",
            GeometryErrorKind::DegenerateGeometry => "degenerate-geometry",
        })
    }
}

impl GeometryError {
    pub fn kind(&self) -> GeometryErrorKind {
        match self {
            GeometryError::Missing3d(_)
            | GeometryError::MissingCoordinates(_)
            | GeometryError::MissingTwist(_)
            | GeometryError::NoStemPositions => GeometryErrorKind::GeometryUnavailable,
            GeometryError::UnknownElement(_)
            | GeometryError::NucleotideOutOfRange { .. }
            | GeometryError::SingleStranded(_)
            | GeometryError::Graph(_) => GeometryErrorKind::LookupFailed,
            GeometryError::Degenerate(_) => GeometryErrorKind::DegenerateGeometry,
        }
    }
}

/// 3D data attached to a coarse-grained structure.
///
/// Every element may carry a start/end point (for stems: the helix axis, start at the
/// `a`/`d` end). Stems may carry twist vectors, and individual nucleotides may carry
/// explicit virtual-residue positions which take precedence over the helix model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coords3d {
    elements: HashMap<ElementId, (Point3<f64>, Point3<f64>)>,
    twists: HashMap<ElementId, (Vector3<f64>, Vector3<f64>)>,
    virtual_residues: HashMap<usize, Point3<f64>>,
}

impl Coords3d {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_element(&mut self, id: ElementId, start: Point3<f64>, end: Point3<f64>) {
        self.elements.insert(id, (start, end));
    }

    pub fn set_twist(&mut self, id: ElementId, start: Vector3<f64>, end: Vector3<f64>) {
        self.twists.insert(id, (start, end));
    }

    pub fn set_virtual_residue(&mut self, nt: usize, position: Point3<f64>) {
        self.virtual_residues.insert(nt, position);
    }

    pub fn element(&self, id: ElementId) -> Option<(Point3<f64>, Point3<f64>)> {
        self.elements.get(&id).copied()
    }

    pub fn twist(&self, id: ElementId) -> Option<(Vector3<f64>, Vector3<f64>)> {
        self.twists.get(&id).copied()
    }

    pub fn virtual_residue(&self, nt: usize) -> Option<Point3<f64>> {
        self.virtual_residues.get(&nt).copied()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.virtual_residues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ElementKind;

    #[test]
    fn error_kinds_classify_failures() {
        let s0 = ElementId::new(ElementKind::Stem, 0);
        assert_eq!(
            GeometryError::Missing3d("x".into()).kind(),
            GeometryErrorKind::GeometryUnavailable
        );
        assert_eq!(
            GeometryError::MissingTwist(s0).kind(),
            GeometryErrorKind::GeometryUnavailable
        );
        assert_eq!(
            GeometryError::UnknownElement("q7".into()).kind(),
            GeometryErrorKind::LookupFailed
        );
        assert_eq!(
            GeometryError::Degenerate("zero".into()).kind().to_string(),
            "degenerate-geometry"
        );
    }

    #[test]
    fn coords_store_and_return_points() {
        let s0 = ElementId::new(ElementKind::Stem, 0);
        let mut coords = Coords3d::new();
        assert!(coords.is_empty());
        coords.set_element(s0, Point3::origin(), Point3::new(0.0, 0.0, 1.0));
        coords.set_twist(s0, Vector3::x(), Vector3::y());
        assert_eq!(coords.element(s0).unwrap().1, Point3::new(0.0, 0.0, 1.0));
        assert_eq!(coords.twist(s0).unwrap().1, Vector3::y());
        assert!(coords.virtual_residue(1).is_none());
        assert!(!coords.is_empty());
    }
}

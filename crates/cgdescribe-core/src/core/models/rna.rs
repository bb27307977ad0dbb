use super::coords::{Coords3d, GeometryError};
use super::graph::{BulgeGraph, ElementShape, GraphError, StemDefine};
use super::ids::{ElementId, ElementKind};
use crate::core::topology::multiloop::{self, Multiloop, MultiloopDescription};
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};

/// Distance (Angstrom) of a stem's virtual residues from the helix axis.
pub const VIRTUAL_RESIDUE_RADIUS: f64 = 7.0;

/// Point set used for the shape metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RogMethod {
    /// Stem axis end points only.
    Fast,
    /// Virtual residues of every stem nucleotide.
    VirtualResidues,
}

/// A coarse-grained RNA structure: its element graph plus optional 3D data.
#[derive(Debug, Clone)]
pub struct CoarseGrainRna {
    name: String,
    graph: BulgeGraph,
    coords: Option<Coords3d>,
}

impl CoarseGrainRna {
    pub fn new(name: impl Into<String>, graph: BulgeGraph) -> Self {
        Self {
            name: name.into(),
            graph,
            coords: None,
        }
    }

    pub fn with_coords(mut self, coords: Coords3d) -> Self {
        self.coords = Some(coords);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &BulgeGraph {
        &self.graph
    }

    pub fn coords(&self) -> Option<&Coords3d> {
        self.coords.as_ref()
    }

    pub fn has_3d(&self) -> bool {
        self.coords.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn seq_length(&self) -> usize {
        self.graph.seq_length()
    }

    pub fn find_mlonly_multiloops(&self) -> Result<Vec<Multiloop>, GraphError> {
        multiloop::find_mlonly_multiloops(&self.graph)
    }

    pub fn describe_multiloop(
        &self,
        multiloop: &Multiloop,
    ) -> Result<MultiloopDescription, GraphError> {
        multiloop::describe_multiloop(&self.graph, multiloop)
    }

    pub fn angle_type(&self, id: ElementId) -> Result<i8, GraphError> {
        multiloop::angle_type(&self.graph, id)
    }

    pub fn element_length(&self, id: ElementId) -> Result<usize, GraphError> {
        self.graph.element_length(id)
    }

    pub fn connections(&self, id: ElementId) -> Result<Vec<ElementId>, GraphError> {
        self.graph.connections(id)
    }

    fn coords_3d(&self) -> Result<&Coords3d, GeometryError> {
        self.coords
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GeometryError::Missing3d(self.name.clone()))
    }

    /// Axis end point of the stem holding `nt`, on the side where `nt` sits.
    fn stem_endpoint(&self, nt: usize) -> Result<Point3<f64>, GeometryError> {
        let (stem_id, define) = self
            .graph
            .stem_containing(nt)
            .ok_or(GeometryError::SingleStranded(nt))?;
        let (start, end) = self
            .coords_3d()?
            .element(stem_id)
            .ok_or(GeometryError::MissingCoordinates(stem_id))?;
        Ok(if nt == define.a || nt == define.d {
            start
        } else {
            end
        })
    }

    /// Start and end point of an element. Interior loops and multiloop segments without
    /// explicit coordinates span the stem ends they connect.
    pub fn element_coords(&self, id: ElementId) -> Result<(Point3<f64>, Point3<f64>), GeometryError> {
        let coords = self.coords_3d()?;
        if !self.graph.contains(id) {
            return Err(GeometryError::UnknownElement(id.to_string()));
        }
        if let Some(points) = coords.element(id) {
            return Ok(points);
        }
        if !matches!(id.kind, ElementKind::Interior | ElementKind::Multiloop) {
            return Err(GeometryError::MissingCoordinates(id));
        }
        let segment = self
            .graph
            .segments(id)?
            .first()
            .copied()
            .ok_or(GeometryError::MissingCoordinates(id))?;
        match (segment.after, segment.before) {
            (Some(after), Some(before)) => {
                Ok((self.stem_endpoint(after)?, self.stem_endpoint(before)?))
            }
            _ => Err(GeometryError::MissingCoordinates(id)),
        }
    }

    pub fn direction(&self, id: ElementId) -> Result<Vector3<f64>, GeometryError> {
        let (start, end) = self.element_coords(id)?;
        Ok(end - start)
    }

    /// Direction of an element given by name, e.g. `"s0"`.
    pub fn direction_of(&self, name: &str) -> Result<Vector3<f64>, GeometryError> {
        let id: ElementId = name
            .parse()
            .map_err(|_| GeometryError::UnknownElement(name.to_string()))?;
        self.direction(id)
    }

    /// Position of the virtual residue of nucleotide `nt` (1-based).
    ///
    /// Stem nucleotides are placed on a helix around the stem axis, interpolating the twist
    /// between both stem ends. With `allow_single_stranded`, loop nucleotides are spread
    /// evenly between the stem ends flanking their segment.
    pub fn virtual_residue(
        &self,
        nt: usize,
        allow_single_stranded: bool,
    ) -> Result<Point3<f64>, GeometryError> {
        let length = self.seq_length();
        if nt == 0 || nt > length {
            return Err(GeometryError::NucleotideOutOfRange { nt, length });
        }
        let coords = self.coords_3d()?;
        if let Some(position) = coords.virtual_residue(nt) {
            return Ok(position);
        }
        let owner = self
            .graph
            .element_at(nt)
            .ok_or(GeometryError::SingleStranded(nt))?;
        match self.graph.element(owner).map(|e| &e.shape) {
            Some(ElementShape::Stem(define)) => self.stem_virtual_residue(owner, define, nt),
            Some(ElementShape::Loop(_)) if allow_single_stranded => {
                self.loop_virtual_residue(owner, nt)
            }
            _ => Err(GeometryError::SingleStranded(nt)),
        }
    }

    fn stem_virtual_residue(
        &self,
        id: ElementId,
        define: &StemDefine,
        nt: usize,
    ) -> Result<Point3<f64>, GeometryError> {
        let coords = self.coords_3d()?;
        let (start, end) = coords
            .element(id)
            .ok_or(GeometryError::MissingCoordinates(id))?;
        let (twist_start, twist_end) = coords.twist(id).ok_or(GeometryError::MissingTwist(id))?;

        let axis = end - start;
        if axis.norm() <= f64::EPSILON {
            return Err(GeometryError::Degenerate(format!("stem {} has zero length", id)));
        }
        let unit_axis = axis.normalize();
        let perpendicular = twist_start - unit_axis * unit_axis.dot(&twist_start);
        if perpendicular.norm() <= f64::EPSILON {
            return Err(GeometryError::Degenerate(format!(
                "twist of stem {} is parallel to its axis",
                id
            )));
        }

        let (pair_index, second_strand) = define
            .pair_index(nt)
            .ok_or(GeometryError::SingleStranded(nt))?;
        let fraction = if define.length() > 1 {
            pair_index as f64 / (define.length() - 1) as f64
        } else {
            0.0
        };

        let total_twist = geometry::signed_angle_about(&axis, &twist_start, &twist_end);
        let rotation = geometry::rotation_from_axis_angle(&axis, total_twist * fraction);
        let mut radial = rotation * perpendicular.normalize();
        if second_strand {
            radial = -radial;
        }
        Ok(start + axis * fraction + radial * VIRTUAL_RESIDUE_RADIUS)
    }

    fn loop_virtual_residue(&self, id: ElementId, nt: usize) -> Result<Point3<f64>, GeometryError> {
        let length = self.seq_length();
        let segment = self
            .graph
            .segments(id)?
            .iter()
            .find(|s| s.nucleotides(length).contains(&nt))
            .copied()
            .ok_or(GeometryError::SingleStranded(nt))?;

        let after = segment.after.map(|nt| self.stem_endpoint(nt)).transpose()?;
        let before = segment.before.map(|nt| self.stem_endpoint(nt)).transpose()?;
        // dangling ends collapse onto the stem end they hang from
        let (from, to) = match (after, before) {
            (Some(from), Some(to)) => (from, to),
            (Some(point), None) | (None, Some(point)) => (point, point),
            (None, None) => self.element_coords(id)?,
        };
        let range = segment.nucleotides(length);
        let offset = (nt - range.start() + 1) as f64;
        let fraction = offset / (segment.len(length) + 1) as f64;
        Ok(from + (to - from) * fraction)
    }

    /// Axis end points of every stem, in stem order.
    pub fn ordered_stem_positions(&self) -> Result<Vec<Point3<f64>>, GeometryError> {
        let coords = self.coords_3d()?;
        let mut positions = Vec::new();
        for (id, _) in self.graph.stems() {
            let (start, end) = coords
                .element(id)
                .ok_or(GeometryError::MissingCoordinates(id))?;
            positions.push(start);
            positions.push(end);
        }
        Ok(positions)
    }

    /// Virtual residues of every stem nucleotide, in stem order and 5' to 3' within a stem.
    pub fn ordered_virtual_residue_positions(&self) -> Result<Vec<Point3<f64>>, GeometryError> {
        self.coords_3d()?;
        let mut positions = Vec::new();
        for (_, define) in self.graph.stems() {
            for nt in define.nucleotides() {
                positions.push(self.virtual_residue(nt, false)?);
            }
        }
        Ok(positions)
    }

    pub fn positions(&self, method: RogMethod) -> Result<Vec<Point3<f64>>, GeometryError> {
        let positions = match method {
            RogMethod::Fast => self.ordered_stem_positions()?,
            RogMethod::VirtualResidues => self.ordered_virtual_residue_positions()?,
        };
        if positions.is_empty() {
            return Err(GeometryError::NoStemPositions);
        }
        Ok(positions)
    }

    pub fn radius_of_gyration(&self, method: RogMethod) -> Result<f64, GeometryError> {
        let positions = self.positions(method)?;
        geometry::radius_of_gyration(&positions).ok_or(GeometryError::NoStemPositions)
    }

    /// Distance between the virtual residues flanking a junction segment.
    pub fn junction_virtual_atom_distance(&self, id: ElementId) -> Result<f64, GeometryError> {
        let segment = self
            .graph
            .segments(id)?
            .first()
            .copied()
            .ok_or(GeometryError::MissingCoordinates(id))?;
        let (Some(after), Some(before)) = (segment.after, segment.before) else {
            return Err(GeometryError::Degenerate(format!(
                "segment {} touches a chain end",
                id
            )));
        };
        let p1 = self.virtual_residue(after, false)?;
        let p2 = self.virtual_residue(before, false)?;
        Ok(geometry::vec_distance(&p1, &p2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::dotbracket::parse_pair_table;
    use crate::core::models::decomposition::decompose;

    const TOLERANCE: f64 = 1e-9;

    fn id(text: &str) -> ElementId {
        text.parse().unwrap()
    }

    fn single_stem_rna() -> CoarseGrainRna {
        let graph = decompose("", &parse_pair_table("(((...)))").unwrap()).unwrap();
        let mut coords = Coords3d::new();
        coords.set_element(id("s0"), Point3::origin(), Point3::new(0.0, 0.0, 10.0));
        coords.set_twist(id("s0"), Vector3::x(), Vector3::x());
        CoarseGrainRna::new("hairpin", graph).with_coords(coords)
    }

    #[test]
    fn structure_without_coords_reports_missing_3d() {
        let graph = decompose("", &parse_pair_table("(((...)))").unwrap()).unwrap();
        let rna = CoarseGrainRna::new("flat", graph);
        assert!(!rna.has_3d());
        assert_eq!(
            rna.radius_of_gyration(RogMethod::Fast).unwrap_err(),
            GeometryError::Missing3d("flat".into())
        );
        assert!(matches!(
            rna.virtual_residue(1, true),
            Err(GeometryError::Missing3d(_))
        ));
    }

    #[test]
    fn fast_radius_of_gyration_uses_stem_end_points() {
        let rna = single_stem_rna();
        let rog = rna.radius_of_gyration(RogMethod::Fast).unwrap();
        assert!((rog - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn paired_virtual_residues_sit_on_opposite_sides_of_the_axis() {
        let rna = single_stem_rna();
        let first = rna.virtual_residue(1, false).unwrap();
        let partner = rna.virtual_residue(9, false).unwrap();
        assert!((first - Point3::new(VIRTUAL_RESIDUE_RADIUS, 0.0, 0.0)).norm() < TOLERANCE);
        assert!((geometry::vec_distance(&first, &partner) - 2.0 * VIRTUAL_RESIDUE_RADIUS).abs() < TOLERANCE);
        let top = rna.virtual_residue(3, false).unwrap();
        assert!((top.z - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn loop_residues_require_single_stranded_permission() {
        let rna = single_stem_rna();
        assert_eq!(
            rna.virtual_residue(5, false).unwrap_err(),
            GeometryError::SingleStranded(5)
        );
        // hairpin nucleotides span the two top stem ends, which coincide on the axis
        let position = rna.virtual_residue(5, true).unwrap();
        assert!((position - Point3::new(0.0, 0.0, 10.0)).norm() < TOLERANCE);
    }

    #[test]
    fn out_of_range_nucleotide_is_a_lookup_failure() {
        let rna = single_stem_rna();
        assert!(matches!(
            rna.virtual_residue(42, true),
            Err(GeometryError::NucleotideOutOfRange { nt: 42, length: 9 })
        ));
    }

    #[test]
    fn direction_of_unknown_element_fails() {
        let rna = single_stem_rna();
        assert!(matches!(
            rna.direction_of("s7"),
            Err(GeometryError::UnknownElement(_))
        ));
        assert!(matches!(
            rna.direction_of("bogus"),
            Err(GeometryError::UnknownElement(_))
        ));
        assert_eq!(rna.direction_of("s0").unwrap(), Vector3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn multiloop_segment_direction_is_derived_from_stem_ends() {
        let graph = decompose("", &parse_pair_table("((..))((..))").unwrap()).unwrap();
        let mut coords = Coords3d::new();
        coords.set_element(id("s0"), Point3::origin(), Point3::new(0.0, 0.0, 5.0));
        coords.set_element(id("s1"), Point3::new(3.0, 0.0, 0.0), Point3::new(3.0, 0.0, 5.0));
        let rna = CoarseGrainRna::new("pair", graph).with_coords(coords);
        assert_eq!(rna.direction(id("m0")).unwrap(), Vector3::new(3.0, 0.0, 0.0));
    }
}

use crate::core::models::graph::{BulgeGraph, GraphError, Segment, StemSide};
use crate::core::models::ids::{ElementId, ElementKind};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// A multiloop: the junction segments visited while walking around one loop, in order.
///
/// Closed multiloops return to their first segment; open ones run into a chain end and
/// are part of the exterior loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiloop {
    elements: Vec<ElementId>,
    closed: bool,
}

impl Multiloop {
    pub fn new(elements: Vec<ElementId>, closed: bool) -> Self {
        Self { elements, closed }
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The `m` elements of this loop, excluding the 5'/3' unpaired ends.
    pub fn segments(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements
            .iter()
            .copied()
            .filter(|e| e.kind == ElementKind::Multiloop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MultiloopDescriptor {
    Open,
    Pseudoknot,
    RegularMultiloop,
}

impl fmt::Display for MultiloopDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultiloopDescriptor::Open => "open",
            MultiloopDescriptor::Pseudoknot => "pseudoknot",
            MultiloopDescriptor::RegularMultiloop => "regular_multiloop",
        })
    }
}

pub type MultiloopDescription = BTreeSet<MultiloopDescriptor>;

fn single_segment(graph: &BulgeGraph, id: ElementId) -> Result<Segment, GraphError> {
    graph
        .segments(id)?
        .first()
        .copied()
        .ok_or_else(|| GraphError::InvalidSegment {
            id,
            reason: "element has no segments".to_string(),
        })
}

/// Finds every loop made up only of multiloop segments and unpaired chain ends.
///
/// Starting from a segment, the walk enters the stem at the segment's 3' flank, crosses to
/// the paired nucleotide and continues with the segment that follows it. Loops are returned
/// in 5' order of their first segment.
pub fn find_mlonly_multiloops(graph: &BulgeGraph) -> Result<Vec<Multiloop>, GraphError> {
    let mut junctions: Vec<(ElementId, Segment)> = Vec::new();
    for id in graph.element_ids().filter(|id| id.kind.is_junction_kind()) {
        junctions.push((id, single_segment(graph, id)?));
    }
    junctions.sort_by_key(|(_, seg)| seg.after.map_or(0, |nt| nt + 1));

    let by_after: HashMap<usize, ElementId> = junctions
        .iter()
        .filter_map(|(id, seg)| seg.after.map(|nt| (nt, *id)))
        .collect();

    let mut successors: HashMap<ElementId, ElementId> = HashMap::new();
    for (id, seg) in &junctions {
        let Some(before) = seg.before else {
            continue;
        };
        let Some((_, stem)) = graph.stem_containing(before) else {
            continue;
        };
        let partner = match stem.entry_side(before) {
            Some(StemSide::A) => stem.d,
            Some(StemSide::C) => stem.b,
            _ => continue,
        };
        if let Some(next) = by_after.get(&partner) {
            successors.insert(*id, *next);
        }
    }
    let has_predecessor: HashSet<ElementId> = successors.values().copied().collect();

    let mut visited: HashSet<ElementId> = HashSet::new();
    let mut loops = Vec::new();

    for (start, _) in junctions.iter().filter(|(id, _)| !has_predecessor.contains(id)) {
        let mut elements = Vec::new();
        let mut current = Some(*start);
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            elements.push(id);
            current = successors.get(&id).copied();
        }
        loops.push(Multiloop::new(elements, false));
    }

    for (start, _) in &junctions {
        if visited.contains(start) {
            continue;
        }
        let mut elements = Vec::new();
        let mut current = *start;
        let mut closed = false;
        loop {
            if !visited.insert(current) {
                closed = current == *start;
                break;
            }
            elements.push(current);
            match successors.get(&current) {
                Some(next) => current = *next,
                None => break,
            }
        }
        loops.push(Multiloop::new(elements, closed));
    }

    let position = |ml: &Multiloop| -> usize {
        ml.elements
            .iter()
            .filter_map(|id| graph.segments(*id).ok()?.first().copied())
            .map(|seg| seg.after.map_or(0, |nt| nt + 1))
            .min()
            .unwrap_or(0)
    };
    loops.sort_by_key(position);
    Ok(loops)
}

/// Classifies a multiloop as `open` (part of the exterior loop), `pseudoknot` (contains a
/// segment with angle type 5) and/or `regular_multiloop` (neither).
pub fn describe_multiloop(
    graph: &BulgeGraph,
    multiloop: &Multiloop,
) -> Result<MultiloopDescription, GraphError> {
    let mut descriptors = MultiloopDescription::new();

    let touches_chain_end = multiloop
        .elements()
        .iter()
        .any(|e| matches!(e.kind, ElementKind::FivePrime | ElementKind::ThreePrime));
    if touches_chain_end || !multiloop.is_closed() {
        descriptors.insert(MultiloopDescriptor::Open);
    }

    for segment in multiloop.segments() {
        if angle_type(graph, segment)?.abs() == 5 {
            descriptors.insert(MultiloopDescriptor::Pseudoknot);
            break;
        }
    }

    if descriptors.is_empty() {
        descriptors.insert(MultiloopDescriptor::RegularMultiloop);
    }
    Ok(descriptors)
}

/// Signed angle type of a junction segment from the stem sides it connects.
///
/// With the connected stems ordered by first nucleotide, side pairs `(1,0)`, `(3,0)` and
/// `(2,3)` map to 2, 3 and 4 (negated when reversed); `(2,1)` is the pseudoknot case 5.
/// Interior loops are always type 1.
pub fn angle_type(graph: &BulgeGraph, id: ElementId) -> Result<i8, GraphError> {
    match id.kind {
        ElementKind::Interior => return Ok(1),
        ElementKind::Multiloop => {}
        _ => {
            return Err(GraphError::UnresolvedConnection {
                id,
                reason: "angle types are only defined for junction segments".to_string(),
            });
        }
    }

    let segment = single_segment(graph, id)?;
    let (Some(after), Some(before)) = (segment.after, segment.before) else {
        return Err(GraphError::UnresolvedConnection {
            id,
            reason: "segment touches a chain end".to_string(),
        });
    };

    let connections = graph.connections(id)?;
    let [first, second] = connections.as_slice() else {
        return Err(GraphError::UnresolvedConnection {
            id,
            reason: format!("expected two connected stems, found {}", connections.len()),
        });
    };

    let side_of = |stem_id: ElementId| -> Result<u8, GraphError> {
        let define = graph.stem(stem_id)?;
        let side = if define.contains(after) {
            define.exit_side(after)
        } else {
            define.entry_side(before)
        };
        side.map(StemSide::code)
            .ok_or_else(|| GraphError::UnresolvedConnection {
                id,
                reason: format!("segment does not touch a strand end of {}", stem_id),
            })
    };

    let (s1, s2) = (side_of(*first)?, side_of(*second)?);
    match (s1, s2) {
        (1, 0) => Ok(2),
        (0, 1) => Ok(-2),
        (3, 0) => Ok(3),
        (0, 3) => Ok(-3),
        (2, 3) => Ok(4),
        (3, 2) => Ok(-4),
        (2, 1) => Ok(5),
        (1, 2) => Ok(-5),
        _ => Err(GraphError::WeirdAngleType {
            id,
            first: s1,
            second: s2,
        }),
    }
}

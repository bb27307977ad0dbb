use super::ids::{ElementId, ElementKind};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Element {0} is defined more than once")]
    DuplicateElement(ElementId),

    #[error("Invalid stem {id}: {reason}")]
    InvalidStem { id: ElementId, reason: String },

    #[error("Nucleotide {nt} is outside the sequence (length {length})")]
    NucleotideOutOfRange { nt: usize, length: usize },

    #[error("Nucleotide {nt} is claimed by both {first} and {second}")]
    OverlappingElements {
        nt: usize,
        first: ElementId,
        second: ElementId,
    },

    #[error("Invalid segment in {id}: {reason}")]
    InvalidSegment { id: ElementId, reason: String },

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Element {0} is not a stem")]
    NotAStem(ElementId),

    #[error("Element {0} is not a loop element")]
    NotALoop(ElementId),

    #[error("Cannot resolve the connections of {id}: {reason}")]
    UnresolvedConnection { id: ElementId, reason: String },

    #[error("Weird angle type for {id}: stem sides ({first}, {second}) are not a known junction geometry")]
    WeirdAngleType { id: ElementId, first: u8, second: u8 },

    #[error("Sequence has {actual} nucleotides but the declared length is {declared}")]
    SequenceLengthMismatch { declared: usize, actual: usize },
}

/// One of the four terminal nucleotides of a stem.
///
/// Side codes follow the stem define `[a, b, c, d]`: `a = 0`, `b = 1`, `c = 2`, `d = 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StemSide {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

impl StemSide {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Nucleotide boundaries of a stem: strand `a..=b` pairs with `c..=d`, `a` with `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StemDefine {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

impl StemDefine {
    pub fn new(id: ElementId, a: usize, b: usize, c: usize, d: usize) -> Result<Self, GraphError> {
        let invalid = |reason: &str| GraphError::InvalidStem {
            id,
            reason: reason.to_string(),
        };
        if a == 0 {
            return Err(invalid("nucleotide numbering starts at 1"));
        }
        if !(a <= b && b < c && c <= d) {
            return Err(invalid("expected a <= b < c <= d"));
        }
        if b - a != d - c {
            return Err(invalid("both strands must have the same length"));
        }
        Ok(Self { a, b, c, d })
    }

    /// Number of base pairs.
    pub fn length(&self) -> usize {
        self.b - self.a + 1
    }

    pub fn contains(&self, nt: usize) -> bool {
        (self.a..=self.b).contains(&nt) || (self.c..=self.d).contains(&nt)
    }

    pub fn partner(&self, nt: usize) -> Option<usize> {
        if (self.a..=self.b).contains(&nt) {
            Some(self.d - (nt - self.a))
        } else if (self.c..=self.d).contains(&nt) {
            Some(self.b - (nt - self.c))
        } else {
            None
        }
    }

    /// Side at which a segment starting right after `nt` leaves this stem.
    pub fn exit_side(&self, nt: usize) -> Option<StemSide> {
        if nt == self.b {
            Some(StemSide::B)
        } else if nt == self.d {
            Some(StemSide::D)
        } else {
            None
        }
    }

    /// Side at which a segment ending right before `nt` enters this stem.
    pub fn entry_side(&self, nt: usize) -> Option<StemSide> {
        if nt == self.a {
            Some(StemSide::A)
        } else if nt == self.c {
            Some(StemSide::C)
        } else {
            None
        }
    }

    /// Base-pair index (0 at the `a`/`d` end) of a stem nucleotide and whether it is on the
    /// second strand.
    pub fn pair_index(&self, nt: usize) -> Option<(usize, bool)> {
        if (self.a..=self.b).contains(&nt) {
            Some((nt - self.a, false))
        } else if (self.c..=self.d).contains(&nt) {
            Some((self.d - nt, true))
        } else {
            None
        }
    }

    pub fn nucleotides(&self) -> impl Iterator<Item = usize> + '_ {
        (self.a..=self.b).chain(self.c..=self.d)
    }
}

/// An unpaired stretch delimited by its flanking paired nucleotides.
///
/// `after` is the paired nucleotide immediately 5' of the stretch and `before` the one
/// immediately 3' of it; either is `None` at the chain ends. The stretch may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub after: Option<usize>,
    pub before: Option<usize>,
}

impl Segment {
    pub fn new(after: Option<usize>, before: Option<usize>) -> Self {
        Self { after, before }
    }

    pub fn nucleotides(&self, seq_length: usize) -> RangeInclusive<usize> {
        let start = self.after.map_or(1, |nt| nt + 1);
        let end = self.before.map_or(seq_length, |nt| nt - 1);
        start..=end
    }

    pub fn len(&self, seq_length: usize) -> usize {
        let range = self.nucleotides(seq_length);
        (range.end() + 1).saturating_sub(*range.start())
    }

    pub fn is_empty(&self, seq_length: usize) -> bool {
        self.len(seq_length) == 0
    }

    fn position_key(&self) -> usize {
        self.after.map_or(0, |nt| nt + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementShape {
    Stem(StemDefine),
    Loop(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub shape: ElementShape,
}

impl Element {
    fn position_key(&self) -> usize {
        match &self.shape {
            ElementShape::Stem(stem) => stem.a,
            ElementShape::Loop(segments) => segments
                .iter()
                .map(Segment::position_key)
                .min()
                .unwrap_or(0),
        }
    }
}

/// The secondary-structure element graph of one RNA chain.
#[derive(Debug, Clone, Default)]
pub struct BulgeGraph {
    seq_length: usize,
    sequence: String,
    elements: BTreeMap<ElementId, Element>,
    edges: BTreeMap<ElementId, BTreeSet<ElementId>>,
    /// Owning element per nucleotide; index 0 is unused.
    nt_owner: Vec<Option<ElementId>>,
}

impl BulgeGraph {
    pub fn seq_length(&self) -> usize {
        self.seq_length
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn count_kind(&self, kind: ElementKind) -> usize {
        self.elements.keys().filter(|id| id.kind == kind).count()
    }

    /// Stems ordered by their first nucleotide.
    pub fn stems(&self) -> Vec<(ElementId, &StemDefine)> {
        let mut stems: Vec<_> = self
            .elements
            .values()
            .filter_map(|e| match &e.shape {
                ElementShape::Stem(define) => Some((e.id, define)),
                ElementShape::Loop(_) => None,
            })
            .collect();
        stems.sort_by_key(|(_, define)| define.a);
        stems
    }

    pub fn stem(&self, id: ElementId) -> Result<&StemDefine, GraphError> {
        match self.elements.get(&id).map(|e| &e.shape) {
            Some(ElementShape::Stem(define)) => Ok(define),
            Some(ElementShape::Loop(_)) => Err(GraphError::NotAStem(id)),
            None => Err(GraphError::UnknownElement(id.to_string())),
        }
    }

    pub fn segments(&self, id: ElementId) -> Result<&[Segment], GraphError> {
        match self.elements.get(&id).map(|e| &e.shape) {
            Some(ElementShape::Loop(segments)) => Ok(segments),
            Some(ElementShape::Stem(_)) => Err(GraphError::NotALoop(id)),
            None => Err(GraphError::UnknownElement(id.to_string())),
        }
    }

    pub fn element_at(&self, nt: usize) -> Option<ElementId> {
        self.nt_owner.get(nt).copied().flatten()
    }

    pub fn stem_containing(&self, nt: usize) -> Option<(ElementId, &StemDefine)> {
        let id = self.element_at(nt)?;
        self.stem(id).ok().map(|define| (id, define))
    }

    pub fn neighbors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.edges.get(&id).into_iter().flatten().copied()
    }

    /// Base pairs for stems, unpaired nucleotides for every other element.
    pub fn element_length(&self, id: ElementId) -> Result<usize, GraphError> {
        let element = self
            .elements
            .get(&id)
            .ok_or_else(|| GraphError::UnknownElement(id.to_string()))?;
        Ok(match &element.shape {
            ElementShape::Stem(define) => define.length(),
            ElementShape::Loop(segments) => {
                segments.iter().map(|s| s.len(self.seq_length)).sum()
            }
        })
    }

    /// The stems adjacent to an element, ordered by their first nucleotide.
    pub fn connections(&self, id: ElementId) -> Result<Vec<ElementId>, GraphError> {
        if !self.contains(id) {
            return Err(GraphError::UnknownElement(id.to_string()));
        }
        let mut stems: Vec<(ElementId, usize)> = self
            .neighbors(id)
            .filter_map(|n| self.stem(n).ok().map(|define| (n, define.a)))
            .collect();
        stems.sort_by_key(|(_, a)| *a);
        Ok(stems.into_iter().map(|(n, _)| n).collect())
    }
}

/// Incrementally assembles and validates a [`BulgeGraph`].
#[derive(Debug, Default)]
pub struct BulgeGraphBuilder {
    seq_length: usize,
    sequence: String,
    elements: Vec<Element>,
}

impl BulgeGraphBuilder {
    pub fn new(seq_length: usize) -> Self {
        Self {
            seq_length,
            ..Default::default()
        }
    }

    pub fn sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = sequence.into();
        self
    }

    pub fn add_stem(&mut self, id: ElementId, define: StemDefine) -> &mut Self {
        self.elements.push(Element {
            id,
            shape: ElementShape::Stem(define),
        });
        self
    }

    pub fn add_loop(&mut self, id: ElementId, segments: Vec<Segment>) -> &mut Self {
        self.elements.push(Element {
            id,
            shape: ElementShape::Loop(segments),
        });
        self
    }

    pub(crate) fn extend(&mut self, elements: Vec<Element>) -> &mut Self {
        self.elements.extend(elements);
        self
    }

    pub fn build(self) -> Result<BulgeGraph, GraphError> {
        let n = self.seq_length;
        let actual = self.sequence.chars().count();
        if !self.sequence.is_empty() && actual != n {
            return Err(GraphError::SequenceLengthMismatch {
                declared: n,
                actual,
            });
        }

        let mut elements = BTreeMap::new();
        let mut nt_owner: Vec<Option<ElementId>> = vec![None; n + 1];

        let mut claim = |nt: usize, id: ElementId| -> Result<(), GraphError> {
            if nt == 0 || nt > n {
                return Err(GraphError::NucleotideOutOfRange { nt, length: n });
            }
            match nt_owner[nt] {
                Some(first) if first != id => Err(GraphError::OverlappingElements {
                    nt,
                    first,
                    second: id,
                }),
                _ => {
                    nt_owner[nt] = Some(id);
                    Ok(())
                }
            }
        };

        for element in &self.elements {
            match (&element.shape, element.id.kind.is_stem()) {
                (ElementShape::Stem(define), true) => {
                    for nt in define.nucleotides() {
                        claim(nt, element.id)?;
                    }
                }
                (ElementShape::Loop(_), false) => {}
                (ElementShape::Stem(_), false) => return Err(GraphError::NotALoop(element.id)),
                (ElementShape::Loop(_), true) => return Err(GraphError::NotAStem(element.id)),
            }
        }

        for element in &self.elements {
            if let ElementShape::Loop(segments) = &element.shape {
                for segment in segments {
                    for nt in segment.nucleotides(n) {
                        claim(nt, element.id)?;
                    }
                }
            }
        }

        let mut edges: BTreeMap<ElementId, BTreeSet<ElementId>> = BTreeMap::new();
        for element in &self.elements {
            let ElementShape::Loop(segments) = &element.shape else {
                continue;
            };
            let id = element.id;
            let stem_of = |nt: usize| -> Result<(ElementId, StemDefine), GraphError> {
                let owner = nt_owner.get(nt).copied().flatten().ok_or_else(|| {
                    GraphError::InvalidSegment {
                        id,
                        reason: format!("flanking nucleotide {} is not paired", nt),
                    }
                })?;
                self.elements
                    .iter()
                    .find_map(|e| match (&e.shape, e.id == owner) {
                        (ElementShape::Stem(define), true) => Some((owner, *define)),
                        _ => None,
                    })
                    .ok_or_else(|| GraphError::InvalidSegment {
                        id,
                        reason: format!("flanking nucleotide {} is not in a stem", nt),
                    })
            };

            for segment in segments {
                if let Some(after) = segment.after {
                    let (stem_id, define) = stem_of(after)?;
                    if define.exit_side(after).is_none() {
                        return Err(GraphError::InvalidSegment {
                            id,
                            reason: format!("nucleotide {} does not end a strand of {}", after, stem_id),
                        });
                    }
                    edges.entry(id).or_default().insert(stem_id);
                    edges.entry(stem_id).or_default().insert(id);
                }
                if let Some(before) = segment.before {
                    let (stem_id, define) = stem_of(before)?;
                    if define.entry_side(before).is_none() {
                        return Err(GraphError::InvalidSegment {
                            id,
                            reason: format!("nucleotide {} does not start a strand of {}", before, stem_id),
                        });
                    }
                    edges.entry(id).or_default().insert(stem_id);
                    edges.entry(stem_id).or_default().insert(id);
                }
            }
        }

        for element in self.elements {
            let id = element.id;
            if elements.insert(id, element).is_some() {
                return Err(GraphError::DuplicateElement(id));
            }
        }

        Ok(BulgeGraph {
            seq_length: n,
            sequence: self.sequence,
            elements,
            edges,
            nt_owner,
        })
    }
}

/// Renumbers elements of each kind by 5' position, the naming convention used for
/// decomposed structures.
pub(crate) fn position_ordered(mut elements: Vec<Element>) -> Vec<Element> {
    elements.sort_by_key(|e| (e.id.kind, e.position_key()));
    let mut counters: BTreeMap<ElementKind, usize> = BTreeMap::new();
    for element in &mut elements {
        let counter = counters.entry(element.id.kind).or_insert(0);
        element.id = ElementId::new(element.id.kind, *counter);
        *counter += 1;
    }
    elements
}

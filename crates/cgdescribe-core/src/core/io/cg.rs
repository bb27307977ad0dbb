use crate::core::io::traits::RnaFile;
use crate::core::models::coords::Coords3d;
use crate::core::models::graph::{BulgeGraphBuilder, GraphError, Segment, StemDefine};
use crate::core::models::ids::{ElementId, ElementKind, ParseElementIdError};
use crate::core::models::rna::CoarseGrainRna;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CgError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: CgParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Invalid coarse-grained structure: {0}")]
    Graph(#[from] GraphError),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CgParseErrorKind {
    #[error("Invalid element name: {0}")]
    InvalidElement(#[from] ParseElementIdError),
    #[error("Invalid integer '{0}'")]
    InvalidInt(String),
    #[error("Invalid float '{0}'")]
    InvalidFloat(String),
    #[error("Record '{record}' expects {expected} values, found {found}")]
    WrongFieldCount {
        record: &'static str,
        expected: &'static str,
        found: usize,
    },
}

#[derive(Debug, Default)]
struct RawCg {
    name: Option<String>,
    length: Option<usize>,
    sequence: Option<String>,
    defines: BTreeMap<ElementId, Vec<usize>>,
    connections: BTreeMap<ElementId, Vec<ElementId>>,
    coords: Coords3d,
}

fn parse_int(value: &str, line: usize) -> Result<usize, CgError> {
    value.parse().map_err(|_| CgError::Parse {
        line,
        kind: CgParseErrorKind::InvalidInt(value.to_string()),
    })
}

fn parse_element(value: &str, line: usize) -> Result<ElementId, CgError> {
    value.parse().map_err(|e: ParseElementIdError| CgError::Parse {
        line,
        kind: e.into(),
    })
}

fn wrong_count(record: &'static str, expected: &'static str, found: usize, line: usize) -> CgError {
    CgError::Parse {
        line,
        kind: CgParseErrorKind::WrongFieldCount {
            record,
            expected,
            found,
        },
    }
}

fn parse_floats<const N: usize>(
    fields: &[&str],
    record: &'static str,
    expected: &'static str,
    line: usize,
) -> Result<[f64; N], CgError> {
    if fields.len() != N {
        return Err(wrong_count(record, expected, fields.len() + 1, line));
    }
    let mut values = [0.0; N];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = field.parse().map_err(|_| CgError::Parse {
            line,
            kind: CgParseErrorKind::InvalidFloat(field.to_string()),
        })?;
    }
    Ok(values)
}

/// `<element> x1 y1 z1 x2 y2 z2`
fn parse_element_vectors(
    values: &[&str],
    record: &'static str,
    line: usize,
) -> Result<(ElementId, [f64; 6]), CgError> {
    let Some((id, numbers)) = values.split_first() else {
        return Err(wrong_count(record, "7", 0, line));
    };
    let id = parse_element(id, line)?;
    Ok((id, parse_floats::<6>(numbers, record, "7", line)?))
}

/// Reader for the line-oriented coarse-grained text format.
///
/// Recognized records: `name`, `length`, `seq`, `define`, `connect`, `coord`, `twist` and
/// `vres`. Loop defines list the first and last unpaired nucleotide of each strand; empty
/// multiloop segments have no nucleotides and are placed using their `connect` records.
pub struct CgFile;

impl RnaFile for CgFile {
    type Error = CgError;

    fn read_from(
        reader: &mut impl BufRead,
        default_name: &str,
    ) -> Result<Vec<CoarseGrainRna>, Self::Error> {
        let mut raw = RawCg::default();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let content = line.split('#').next().unwrap_or_default().trim();
            let fields: Vec<&str> = content.split_whitespace().collect();
            let Some((&record, values)) = fields.split_first() else {
                continue;
            };

            match record {
                "name" => raw.name = values.first().map(|s| s.to_string()),
                "length" => {
                    let [value] = values else {
                        return Err(wrong_count("length", "1", values.len(), line_num));
                    };
                    raw.length = Some(parse_int(value, line_num)?);
                }
                "seq" => raw.sequence = Some(values.concat().to_ascii_uppercase()),
                "define" => {
                    let Some((id, nts)) = values.split_first() else {
                        return Err(wrong_count("define", "at least 1", 0, line_num));
                    };
                    let id = parse_element(id, line_num)?;
                    let nts = nts
                        .iter()
                        .map(|nt| parse_int(nt, line_num))
                        .collect::<Result<Vec<_>, _>>()?;
                    if raw.defines.insert(id, nts).is_some() {
                        return Err(GraphError::DuplicateElement(id).into());
                    }
                }
                "connect" => {
                    let ids = values
                        .iter()
                        .map(|v| parse_element(v, line_num))
                        .collect::<Result<Vec<_>, _>>()?;
                    if let Some((stem, neighbors)) = ids.split_first() {
                        for neighbor in neighbors {
                            raw.connections.entry(*neighbor).or_default().push(*stem);
                        }
                    }
                }
                "coord" => {
                    let (id, [x1, y1, z1, x2, y2, z2]) =
                        parse_element_vectors(values, "coord", line_num)?;
                    raw.coords
                        .set_element(id, Point3::new(x1, y1, z1), Point3::new(x2, y2, z2));
                }
                "twist" => {
                    let (id, [x1, y1, z1, x2, y2, z2]) =
                        parse_element_vectors(values, "twist", line_num)?;
                    raw.coords
                        .set_twist(id, Vector3::new(x1, y1, z1), Vector3::new(x2, y2, z2));
                }
                "vres" => {
                    let Some((nt, numbers)) = values.split_first() else {
                        return Err(wrong_count("vres", "4", 0, line_num));
                    };
                    let nt = parse_int(nt, line_num)?;
                    let [x, y, z] = parse_floats::<3>(numbers, "vres", "4", line_num)?;
                    raw.coords.set_virtual_residue(nt, Point3::new(x, y, z));
                }
                other => debug!("Ignoring unknown record '{}' on line {}.", other, line_num),
            }
        }

        let rna = build(raw, default_name)?;
        Ok(vec![rna])
    }
}

fn build(raw: RawCg, default_name: &str) -> Result<CoarseGrainRna, CgError> {
    if raw.defines.is_empty() {
        return Err(CgError::MissingRecord("define".to_string()));
    }
    let max_nt = raw.defines.values().flatten().copied().max().unwrap_or(0);
    let length = raw
        .length
        .or_else(|| raw.sequence.as_ref().map(|s| s.chars().count()))
        .unwrap_or(max_nt);
    if max_nt > length {
        return Err(GraphError::NucleotideOutOfRange {
            nt: max_nt,
            length,
        }
        .into());
    }

    let mut stems: BTreeMap<ElementId, StemDefine> = BTreeMap::new();
    for (id, nts) in raw.defines.iter().filter(|(id, _)| id.kind.is_stem()) {
        let [a, b, c, d] = nts.as_slice() else {
            return Err(CgError::Inconsistency(format!(
                "stem {} needs four nucleotides, found {}",
                id,
                nts.len()
            )));
        };
        stems.insert(*id, StemDefine::new(*id, *a, *b, *c, *d)?);
    }

    let mut builder = BulgeGraphBuilder::new(length).sequence(raw.sequence.clone().unwrap_or_default());
    for (id, define) in &stems {
        builder.add_stem(*id, *define);
    }

    let mut loops: Vec<(ElementId, Vec<Segment>)> = Vec::new();
    let mut used_flanks: HashSet<usize> = HashSet::new();
    for (id, nts) in raw.defines.iter().filter(|(id, _)| !id.kind.is_stem()) {
        if nts.len() % 2 != 0 || nts.len() > 4 {
            return Err(CgError::Inconsistency(format!(
                "loop {} needs a start and end per strand, found {} nucleotides",
                id,
                nts.len()
            )));
        }
        let segments: Vec<Segment> = nts
            .chunks(2)
            .map(|range| {
                let after = (range[0] > 1).then(|| range[0] - 1);
                let before = (range[1] < length).then(|| range[1] + 1);
                Segment::new(after, before)
            })
            .collect();
        used_flanks.extend(segments.iter().filter_map(|s| s.after));
        loops.push((*id, segments));
    }

    // empty strands of multiloops and interior loops only show up in the connections
    for (id, segments) in &mut loops {
        let expected = match id.kind {
            ElementKind::Multiloop => 1,
            ElementKind::Interior => 2,
            _ => continue,
        };
        while segments.len() < expected {
            let segment = empty_segment(*id, &stems, raw.connections.get(&*id), &used_flanks)?;
            if let Some(after) = segment.after {
                used_flanks.insert(after);
            }
            segments.push(segment);
        }
    }

    for (id, segments) in loops {
        builder.add_loop(id, segments);
    }
    let graph = builder.build()?;

    let name = raw.name.unwrap_or_else(|| default_name.to_string());
    debug!(
        "Parsed coarse-grained structure '{}' with {} elements.",
        name,
        graph.len()
    );
    let rna = CoarseGrainRna::new(name, graph);
    Ok(if raw.coords.is_empty() {
        rna
    } else {
        rna.with_coords(raw.coords)
    })
}

/// Locates a zero-length segment between two connected stems: a strand end of one stem
/// directly followed by a strand start of the other.
fn empty_segment(
    id: ElementId,
    stems: &BTreeMap<ElementId, StemDefine>,
    connections: Option<&Vec<ElementId>>,
    used_flanks: &HashSet<usize>,
) -> Result<Segment, CgError> {
    let connected: Vec<&StemDefine> = connections
        .into_iter()
        .flatten()
        .filter_map(|stem| stems.get(stem))
        .collect();
    let unresolved = || {
        CgError::Graph(GraphError::UnresolvedConnection {
            id,
            reason: "no free pair of adjacent strand ends among the connected stems".to_string(),
        })
    };
    let [first, second] = connected.as_slice() else {
        return Err(unresolved());
    };

    [(first, second), (second, first)]
        .into_iter()
        .flat_map(|(from, to)| {
            [from.b, from.d]
                .into_iter()
                .filter(move |&nt| to.entry_side(nt + 1).is_some())
        })
        .filter(|nt| !used_flanks.contains(nt))
        .min()
        .map(|nt| Segment::new(Some(nt), Some(nt + 1)))
        .ok_or_else(unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const THREE_WAY: &str = "\
name three_way
length 30
seq GGGAAGGGAAACCCAAGGGAAACCCAACCC
define s0 1 3 28 30
define s1 6 8 12 14
define s2 17 19 23 25
define m0 4 5
define m1 15 16
define m2 26 27
define h0 9 11
define h1 20 22
connect s0 m0 m2
connect s1 m0 h0 m1
connect s2 m1 h1 m2
coord s0 0.0 0.0 0.0 0.0 0.0 7.0
coord s1 3.0 0.0 10.0 10.0 0.0 10.0
coord s2 -3.0 0.0 10.0 -10.0 0.0 10.0
twist s0 1.0 0.0 0.0 1.0 0.0 0.0
twist s1 0.0 1.0 0.0 0.0 1.0 0.0
twist s2 0.0 1.0 0.0 0.0 1.0 0.0
";

    fn read(content: &str) -> Result<CoarseGrainRna, CgError> {
        CgFile::read_from(&mut Cursor::new(content), "fallback").map(|mut v| v.remove(0))
    }

    fn id(text: &str) -> ElementId {
        text.parse().unwrap()
    }

    #[test]
    fn reads_graph_and_coordinates() {
        let rna = read(THREE_WAY).unwrap();
        assert_eq!(rna.name(), "three_way");
        assert_eq!(rna.seq_length(), 30);
        assert_eq!(rna.graph().len(), 8);
        assert!(rna.has_3d());
        assert_eq!(rna.connections(id("m0")).unwrap(), vec![id("s0"), id("s1")]);
        assert_eq!(rna.angle_type(id("m0")).unwrap(), 2);
        assert_eq!(
            rna.direction(id("s0")).unwrap(),
            Vector3::new(0.0, 0.0, 7.0)
        );
    }

    #[test]
    fn empty_multiloop_segment_is_placed_from_connections() {
        let content = "\
length 12
define s0 1 2 5 6
define s1 7 8 11 12
define h0 3 4
define h1 9 10
define m0
connect s0 h0 m0
connect s1 h1 m0
";
        let rna = read(content).unwrap();
        assert_eq!(rna.name(), "fallback");
        assert_eq!(rna.element_length(id("m0")).unwrap(), 0);
        assert_eq!(
            rna.graph().segments(id("m0")).unwrap(),
            &[Segment::new(Some(6), Some(7))]
        );
    }

    #[test]
    fn bulge_gets_an_empty_opposite_strand() {
        let content = "\
length 13
define s0 1 2 12 13
define s1 5 6 10 11
define i0 3 4
define h0 7 9
connect s0 i0
connect s1 i0 h0
";
        let rna = read(content).unwrap();
        let segments = rna.graph().segments(id("i0")).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1], Segment::new(Some(11), Some(12)));
        assert_eq!(rna.element_length(id("i0")).unwrap(), 2);
    }

    #[test]
    fn comments_and_unknown_records_are_ignored() {
        let content = "# header\nproject somewhere\nlength 6\ndefine s0 1 2 5 6 # stem\ndefine h0 3 4\n";
        let rna = read(content).unwrap();
        assert_eq!(rna.graph().len(), 2);
        assert!(!rna.has_3d());
    }

    #[test]
    fn malformed_records_report_their_line() {
        assert!(matches!(
            read("length six\n"),
            Err(CgError::Parse { line: 1, kind: CgParseErrorKind::InvalidInt(_) })
        ));
        assert!(matches!(
            read("define s0 1 2 5 6\ncoord s0 0 0 0 1 1\n"),
            Err(CgError::Parse {
                line: 2,
                kind: CgParseErrorKind::WrongFieldCount { record: "coord", .. }
            })
        ));
        assert!(matches!(
            read("define x0 1 2\n"),
            Err(CgError::Parse { line: 1, kind: CgParseErrorKind::InvalidElement(_) })
        ));
    }

    #[test]
    fn file_without_defines_is_rejected() {
        assert!(matches!(read("name empty\n"), Err(CgError::MissingRecord(_))));
    }

    #[test]
    fn stem_with_wrong_arity_is_inconsistent() {
        assert!(matches!(
            read("length 6\ndefine s0 1 2 5\n"),
            Err(CgError::Inconsistency(_))
        ));
    }
}

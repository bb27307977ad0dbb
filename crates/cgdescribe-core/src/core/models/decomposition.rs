use super::graph::{
    BulgeGraph, BulgeGraphBuilder, Element, ElementShape, GraphError, Segment, StemDefine,
    StemSide, position_ordered,
};
use super::ids::{ElementId, ElementKind};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct Strand {
    start: usize,
    end: usize,
    stem: usize,
}

/// Decomposes a base-pair table into stems and loop elements.
///
/// `pair_table` is indexed by 1-based nucleotide number (index 0 is ignored) and holds the
/// partner of each paired nucleotide. Consecutive stacked pairs form a stem; the unpaired
/// stretches between stem strands are classified by walking the loop they belong to:
/// a stretch that closes on itself is a hairpin, two stretches bridging two nested stems
/// form an interior loop, and everything else is a multiloop segment (or the 5'/3'
/// unpaired ends).
pub fn decompose(sequence: &str, pair_table: &[Option<usize>]) -> Result<BulgeGraph, GraphError> {
    let n = pair_table.len().saturating_sub(1);

    let stems = find_stems(pair_table)?;
    let mut strands: Vec<Strand> = stems
        .iter()
        .enumerate()
        .flat_map(|(idx, s)| {
            [
                Strand {
                    start: s.a,
                    end: s.b,
                    stem: idx,
                },
                Strand {
                    start: s.c,
                    end: s.d,
                    stem: idx,
                },
            ]
        })
        .collect();
    strands.sort_by_key(|s| s.start);

    let gaps = collect_gaps(&strands, n);
    trace!("Decomposed {} stems and {} unpaired segments.", stems.len(), gaps.len());

    let strand_owner: HashMap<usize, usize> = strands
        .iter()
        .flat_map(|s| (s.start..=s.end).map(move |nt| (nt, s.stem)))
        .collect();
    let gap_after: HashMap<usize, usize> = gaps
        .iter()
        .enumerate()
        .filter_map(|(idx, g)| g.after.map(|nt| (nt, idx)))
        .collect();

    let successor = |gap: &Segment| -> Option<usize> {
        let q = gap.before?;
        let stem = &stems[*strand_owner.get(&q)?];
        let partner = match stem.entry_side(q)? {
            StemSide::A => stem.d,
            _ => stem.b,
        };
        gap_after.get(&partner).copied()
    };

    let mut kinds: Vec<Option<ElementKind>> = vec![None; gaps.len()];
    let mut interior_pairs: Vec<(usize, usize)> = Vec::new();

    for (idx, gap) in gaps.iter().enumerate() {
        if kinds[idx].is_some() {
            continue;
        }
        let Some(next) = successor(gap) else {
            continue;
        };
        if next == idx {
            kinds[idx] = Some(ElementKind::Hairpin);
        } else if successor(&gaps[next]) == Some(idx)
            && is_interior(gap, &gaps[next], &stems, &strand_owner)
        {
            kinds[idx] = Some(ElementKind::Interior);
            kinds[next] = Some(ElementKind::Interior);
            interior_pairs.push((idx.min(next), idx.max(next)));
        }
    }

    let mut elements: Vec<Element> = stems
        .iter()
        .enumerate()
        .map(|(idx, define)| Element {
            id: ElementId::new(ElementKind::Stem, idx),
            shape: ElementShape::Stem(*define),
        })
        .collect();

    for (first, second) in &interior_pairs {
        elements.push(Element {
            id: ElementId::new(ElementKind::Interior, 0),
            shape: ElementShape::Loop(vec![gaps[*first], gaps[*second]]),
        });
    }

    for (idx, gap) in gaps.iter().enumerate() {
        let kind = match kinds[idx] {
            Some(ElementKind::Interior) => continue,
            Some(kind) => kind,
            None if gap.after.is_none() => ElementKind::FivePrime,
            None if gap.before.is_none() => ElementKind::ThreePrime,
            None => ElementKind::Multiloop,
        };
        elements.push(Element {
            id: ElementId::new(kind, 0),
            shape: ElementShape::Loop(vec![*gap]),
        });
    }

    let mut builder = BulgeGraphBuilder::new(n).sequence(sequence);
    builder.extend(position_ordered(elements));
    builder.build()
}

fn find_stems(pair_table: &[Option<usize>]) -> Result<Vec<StemDefine>, GraphError> {
    let n = pair_table.len().saturating_sub(1);
    let mut stems = Vec::new();
    let mut in_stem = vec![false; n + 1];

    for i in 1..=n {
        let Some(j) = pair_table[i] else {
            continue;
        };
        if j <= i || in_stem[i] {
            continue;
        }
        if j > n || pair_table[j] != Some(i) {
            return Err(GraphError::NucleotideOutOfRange { nt: j, length: n });
        }
        let (mut b, mut c) = (i, j);
        while b + 1 < c - 1 && pair_table[b + 1] == Some(c - 1) {
            b += 1;
            c -= 1;
        }
        for nt in (i..=b).chain(c..=j) {
            in_stem[nt] = true;
        }
        let id = ElementId::new(ElementKind::Stem, stems.len());
        stems.push(StemDefine::new(id, i, b, c, j)?);
    }
    Ok(stems)
}

fn collect_gaps(strands: &[Strand], n: usize) -> Vec<Segment> {
    let Some(first) = strands.first() else {
        return if n > 0 {
            vec![Segment::new(None, None)]
        } else {
            Vec::new()
        };
    };

    let mut gaps = Vec::with_capacity(strands.len() + 1);
    if first.start > 1 {
        gaps.push(Segment::new(None, Some(first.start)));
    }
    for window in strands.windows(2) {
        gaps.push(Segment::new(Some(window[0].end), Some(window[1].start)));
    }
    if let Some(last) = strands.last() {
        if last.end < n {
            gaps.push(Segment::new(Some(last.end), None));
        }
    }
    gaps
}

fn is_interior(
    outer_side: &Segment,
    inner_side: &Segment,
    stems: &[StemDefine],
    strand_owner: &HashMap<usize, usize>,
) -> bool {
    let (Some(a1), Some(b1), Some(a2), Some(b2)) = (
        outer_side.after,
        outer_side.before,
        inner_side.after,
        inner_side.before,
    ) else {
        return false;
    };
    let (Some(&outer), Some(&inner)) = (strand_owner.get(&a1), strand_owner.get(&b1)) else {
        return false;
    };
    if outer == inner {
        return false;
    }
    let (outer_stem, inner_stem) = (&stems[outer], &stems[inner]);
    let forward = a1 == outer_stem.b
        && b1 == inner_stem.a
        && a2 == inner_stem.d
        && b2 == outer_stem.c;
    let backward = a2 == inner_stem.b
        && b2 == outer_stem.a
        && a1 == outer_stem.d
        && b1 == inner_stem.c;
    forward || backward
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_table(dotbracket: &str) -> Vec<Option<usize>> {
        let mut table = vec![None; dotbracket.len() + 1];
        let mut stacks: HashMap<char, Vec<usize>> = HashMap::new();
        for (idx, ch) in dotbracket.chars().enumerate() {
            let nt = idx + 1;
            let (open, close) = match ch {
                '(' | ')' => ('(', ')'),
                '[' | ']' => ('[', ']'),
                _ => continue,
            };
            if ch == open {
                stacks.entry(open).or_default().push(nt);
            } else if ch == close {
                let partner = stacks.get_mut(&open).unwrap().pop().unwrap();
                table[nt] = Some(partner);
                table[partner] = Some(nt);
            }
        }
        table
    }

    fn id(text: &str) -> ElementId {
        text.parse().unwrap()
    }

    #[test]
    fn hairpin_with_dangling_ends() {
        let graph = decompose("", &pair_table("..((....))..")).unwrap();
        let ids: Vec<String> = graph.element_ids().map(|e| e.to_string()).collect();
        assert_eq!(ids, vec!["s0", "f0", "t0", "h0"]);
        assert_eq!(graph.element_length(id("h0")).unwrap(), 4);
        assert_eq!(graph.element_length(id("f0")).unwrap(), 2);
    }

    #[test]
    fn interior_loop_and_bulge_are_merged_into_one_element() {
        let graph = decompose("", &pair_table("((..((...)).))")).unwrap();
        assert_eq!(graph.count_kind(ElementKind::Interior), 1);
        assert_eq!(graph.count_kind(ElementKind::Multiloop), 0);
        assert_eq!(graph.segments(id("i0")).unwrap().len(), 2);
        assert_eq!(graph.element_length(id("i0")).unwrap(), 3);
        assert_eq!(graph.connections(id("i0")).unwrap(), vec![id("s0"), id("s1")]);
    }

    #[test]
    fn three_way_junction_has_three_multiloop_segments() {
        let graph = decompose("", &pair_table("(((..(((...)))..(((...)))..)))")).unwrap();
        assert_eq!(graph.count_kind(ElementKind::Stem), 3);
        assert_eq!(graph.count_kind(ElementKind::Multiloop), 3);
        assert_eq!(graph.count_kind(ElementKind::Hairpin), 2);
        assert_eq!(graph.count_kind(ElementKind::FivePrime), 0);
        assert_eq!(graph.segments(id("m0")).unwrap(), &[Segment::new(Some(3), Some(6))]);
        assert_eq!(graph.segments(id("m2")).unwrap(), &[Segment::new(Some(25), Some(28))]);
    }

    #[test]
    fn adjacent_stems_get_a_zero_length_segment() {
        let graph = decompose("", &pair_table("((..))((..))")).unwrap();
        assert_eq!(graph.count_kind(ElementKind::Multiloop), 1);
        assert_eq!(graph.element_length(id("m0")).unwrap(), 0);
        assert_eq!(graph.connections(id("m0")).unwrap(), vec![id("s0"), id("s1")]);
    }

    #[test]
    fn fully_unpaired_chain_is_a_single_five_prime_element() {
        let graph = decompose("ACGU", &pair_table("....")).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.element_length(id("f0")).unwrap(), 4);
    }

    #[test]
    fn pseudoknot_strands_are_separate_stems() {
        let graph = decompose("", &pair_table("..((..[[..))..]]..")).unwrap();
        assert_eq!(graph.count_kind(ElementKind::Stem), 2);
        assert_eq!(graph.count_kind(ElementKind::Multiloop), 3);
        assert_eq!(graph.count_kind(ElementKind::Hairpin), 0);
    }
}

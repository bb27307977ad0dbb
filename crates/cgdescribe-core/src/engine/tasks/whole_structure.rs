use crate::core::models::coords::{GeometryError, GeometryErrorKind};
use crate::core::models::ids::ElementKind;
use crate::core::models::rna::{CoarseGrainRna, RogMethod};
use crate::core::topology::multiloop::MultiloopDescriptor;
use crate::core::utils::geometry;
use crate::engine::config::{DescribeConfig, DescriptorScope, ElementPair, NucleotidePair};
use crate::engine::error::EngineError;
use crate::engine::features::{FeatureRow, FeatureValue};
use crate::engine::utils::ordinal::ordinal;
use nalgebra::Point3;
use tracing::{info, instrument, warn};

const SHAPE_COLUMNS: [&str; 6] = [
    "rog_fast",
    "rog_vres",
    "anisotropy_fast",
    "anisotropy_vres",
    "asphericity_fast",
    "asphericity_vres",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DescriptorCounts {
    open: usize,
    pseudoknot: usize,
    regular: usize,
}

/// Computes the whole-structure feature row of `rna`, the `index`-th (1-based) input.
///
/// Failing distance and angle pairs become `NaN` with a warning; missing 3D data turns
/// every shape metric into `NaN`. Any other failure aborts the structure.
#[instrument(skip_all, name = "whole_structure_task", fields(name = rna.name()))]
pub fn run(
    rna: &CoarseGrainRna,
    index: usize,
    config: &DescribeConfig,
) -> Result<FeatureRow, EngineError> {
    let mut row = FeatureRow::new();
    let graph = rna.graph();

    row.set("nt_length", FeatureValue::count(rna.seq_length()));
    row.set("num_cg_elems", FeatureValue::count(graph.len()));
    for kind in ElementKind::ALL {
        row.set(
            format!("num_{}", kind.code()),
            FeatureValue::count(graph.count_kind(kind)),
        );
    }

    add_multiloop_features(&mut row, rna, config.descriptor_scope)?;
    add_shape_features(&mut row, rna)?;

    for pair in &config.distances {
        let value = distance(rna, pair).unwrap_or_else(|err| {
            warn!(
                "{} File {}: Could not calculate distance between {} and {}: {} occurred: {}",
                ordinal(index),
                rna.name(),
                pair.from,
                pair.to,
                err.kind(),
                err
            );
            f64::NAN
        });
        row.set(pair.column(), value);
    }

    for pair in &config.angles {
        let value = angle(rna, pair).unwrap_or_else(|err| {
            warn!(
                "{} File {}: Could not calculate angle between {} and {}: {} occurred: {}",
                ordinal(index),
                rna.name(),
                pair.first,
                pair.second,
                err.kind(),
                err
            );
            f64::NAN
        });
        row.set(pair.column(), value);
    }

    Ok(row)
}

fn add_multiloop_features(
    row: &mut FeatureRow,
    rna: &CoarseGrainRna,
    scope: DescriptorScope,
) -> Result<(), EngineError> {
    let multiloops = rna.find_mlonly_multiloops()?;

    let mut three_way = 0;
    let mut four_way = 0;
    let mut totals = DescriptorCounts::default();
    let mut last = DescriptorCounts::default();

    for ml in &multiloops {
        let description = rna.describe_multiloop(ml)?;
        let regular = description.contains(&MultiloopDescriptor::RegularMultiloop);
        match (ml.len(), regular) {
            (3, true) => three_way += 1,
            (4, true) => four_way += 1,
            _ => {}
        }
        last = DescriptorCounts {
            open: usize::from(description.contains(&MultiloopDescriptor::Open)),
            pseudoknot: usize::from(description.contains(&MultiloopDescriptor::Pseudoknot)),
            regular: usize::from(regular),
        };
        totals.open += last.open;
        totals.pseudoknot += last.pseudoknot;
        totals.regular += last.regular;
    }

    let counts = match scope {
        DescriptorScope::LastMultiloop => last,
        DescriptorScope::AllMultiloops => totals,
    };
    let longest = multiloops.iter().map(|ml| ml.len()).max().unwrap_or(0);

    row.set("3-way-junctions", FeatureValue::count(three_way));
    row.set("4-way-junctions", FeatureValue::count(four_way));
    row.set("open_mls", FeatureValue::count(counts.open));
    row.set("pseudoknots", FeatureValue::count(counts.pseudoknot));
    row.set("regular_mls", FeatureValue::count(counts.regular));
    row.set("total_mls", FeatureValue::count(multiloops.len()));
    row.set("longest_ml", FeatureValue::count(longest));
    Ok(())
}

fn add_shape_features(row: &mut FeatureRow, rna: &CoarseGrainRna) -> Result<(), EngineError> {
    let rog_fast = match rna.radius_of_gyration(RogMethod::Fast) {
        Ok(value) => value,
        Err(err) if err.kind() == GeometryErrorKind::GeometryUnavailable => {
            info!("No 3D data for {} ({}), shape metrics are NaN.", rna.name(), err);
            for column in SHAPE_COLUMNS {
                row.set(column, f64::NAN);
            }
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let fast = rna.positions(RogMethod::Fast)?;
    let vres = rna.positions(RogMethod::VirtualResidues)?;
    row.set("rog_fast", rog_fast);
    row.set("rog_vres", rna.radius_of_gyration(RogMethod::VirtualResidues)?);
    row.set("anisotropy_fast", shape_metric(geometry::anisotropy, &fast)?);
    row.set("anisotropy_vres", shape_metric(geometry::anisotropy, &vres)?);
    row.set("asphericity_fast", shape_metric(geometry::asphericity, &fast)?);
    row.set("asphericity_vres", shape_metric(geometry::asphericity, &vres)?);
    Ok(())
}

fn shape_metric(
    metric: fn(&[Point3<f64>]) -> Option<f64>,
    points: &[Point3<f64>],
) -> Result<f64, GeometryError> {
    metric(points).ok_or(GeometryError::NoStemPositions)
}

fn distance(rna: &CoarseGrainRna, pair: &NucleotidePair) -> Result<f64, GeometryError> {
    let from = rna.virtual_residue(pair.from, true)?;
    let to = rna.virtual_residue(pair.to, true)?;
    Ok(geometry::vec_distance(&from, &to))
}

fn angle(rna: &CoarseGrainRna, pair: &ElementPair) -> Result<f64, GeometryError> {
    let first = rna.direction_of(&pair.first)?;
    let second = rna.direction_of(&pair.second)?;
    geometry::vec_angle(&first, &second).ok_or_else(|| {
        GeometryError::Degenerate(format!(
            "{} or {} has a zero-length direction",
            pair.first, pair.second
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::cg::CgFile;
    use crate::core::io::dotbracket::DotBracketFile;
    use crate::core::io::traits::RnaFile;
    use crate::engine::config::{DescribeConfigBuilder, DescribeMode};
    use std::io::Cursor;

    const THREE_WAY_CG: &str = "\
name three_way
length 30
define s0 1 3 28 30
define s1 6 8 12 14
define s2 17 19 23 25
define m0 4 5
define m1 15 16
define m2 26 27
define h0 9 11
define h1 20 22
coord s0 0.0 0.0 0.0 0.0 0.0 7.0
coord s1 3.0 0.0 10.0 10.0 0.0 10.0
coord s2 -3.0 0.0 10.0 -10.0 0.0 10.0
twist s0 1.0 0.0 0.0 1.0 0.0 0.0
twist s1 0.0 1.0 0.0 0.0 1.0 0.0
twist s2 0.0 1.0 0.0 0.0 1.0 0.0
";

    fn dotbracket(structure: &str) -> CoarseGrainRna {
        DotBracketFile::read_from(&mut Cursor::new(structure), "db")
            .unwrap()
            .remove(0)
    }

    fn three_way() -> CoarseGrainRna {
        CgFile::read_from(&mut Cursor::new(THREE_WAY_CG), "cg")
            .unwrap()
            .remove(0)
    }

    fn config() -> DescribeConfigBuilder {
        DescribeConfigBuilder::new().mode(DescribeMode::WholeStructure)
    }

    fn int(row: &FeatureRow, key: &str) -> i64 {
        match row.get(key) {
            Some(FeatureValue::Int(v)) => *v,
            other => panic!("{} is not an integer: {:?}", key, other),
        }
    }

    fn float(row: &FeatureRow, key: &str) -> f64 {
        match row.get(key) {
            Some(FeatureValue::Float(v)) => *v,
            other => panic!("{} is not a float: {:?}", key, other),
        }
    }

    #[test]
    fn columns_come_out_in_report_order() {
        let config = config()
            .distances(vec![NucleotidePair::new(1, 30)])
            .angles(vec![ElementPair::new("s0", "s1")])
            .build()
            .unwrap();
        let row = run(&three_way(), 1, &config).unwrap();
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(
            keys,
            vec![
                "nt_length",
                "num_cg_elems",
                "num_s",
                "num_m",
                "num_i",
                "num_f",
                "num_t",
                "num_h",
                "3-way-junctions",
                "4-way-junctions",
                "open_mls",
                "pseudoknots",
                "regular_mls",
                "total_mls",
                "longest_ml",
                "rog_fast",
                "rog_vres",
                "anisotropy_fast",
                "anisotropy_vres",
                "asphericity_fast",
                "asphericity_vres",
                "distance_1_30",
                "angle_s0_s1",
            ]
        );
    }

    #[test]
    fn element_counts_sum_to_total() {
        let row = run(&three_way(), 1, &config().build().unwrap()).unwrap();
        let per_kind: i64 = ["num_s", "num_m", "num_i", "num_f", "num_t", "num_h"]
            .iter()
            .map(|k| int(&row, k))
            .sum();
        assert_eq!(per_kind, int(&row, "num_cg_elems"));
        assert_eq!(int(&row, "num_s"), 3);
        assert_eq!(int(&row, "num_m"), 3);
    }

    #[test]
    fn three_way_junction_is_counted() {
        let row = run(&three_way(), 1, &config().build().unwrap()).unwrap();
        assert_eq!(int(&row, "3-way-junctions"), 1);
        assert_eq!(int(&row, "4-way-junctions"), 0);
        assert_eq!(int(&row, "regular_mls"), 1);
        assert_eq!(int(&row, "total_mls"), 1);
        assert_eq!(int(&row, "longest_ml"), 3);
    }

    #[test]
    fn shape_metrics_are_computed_from_coordinates() {
        let row = run(&three_way(), 1, &config().build().unwrap()).unwrap();
        for column in SHAPE_COLUMNS {
            assert!(float(&row, column).is_finite(), "{} should be finite", column);
        }
        assert!(float(&row, "rog_fast") > 0.0);
    }

    #[test]
    fn missing_3d_data_makes_every_shape_metric_nan() {
        let rna = dotbracket("((...))");
        let row = run(&rna, 1, &config().build().unwrap()).unwrap();
        for column in SHAPE_COLUMNS {
            assert!(float(&row, column).is_nan(), "{} should be NaN", column);
        }
        assert_eq!(int(&row, "longest_ml"), 0);
        assert_eq!(int(&row, "total_mls"), 0);
    }

    #[test]
    fn failing_pairs_become_nan() {
        let config = config()
            .distances(vec![NucleotidePair::new(1, 3), NucleotidePair::new(1, 99)])
            .angles(vec![ElementPair::new("s0", "s9"), ElementPair::new("s0", "s1")])
            .build()
            .unwrap();
        let row = run(&three_way(), 2, &config).unwrap();
        assert!(float(&row, "distance_1_3").is_finite());
        assert!(float(&row, "distance_1_99").is_nan());
        assert!(float(&row, "angle_s0_s9").is_nan());
        let angle = float(&row, "angle_s0_s1");
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    fn warnings_while<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("warnings.log");
        let file = std::fs::File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::WARN)
            .with(fmt::layer().with_writer(file).with_ansi(false));

        let result = tracing::subscriber::with_default(subscriber, f);
        let lines = std::fs::read_to_string(&log_path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        (result, lines)
    }

    #[test]
    fn each_failing_pair_logs_one_warning() {
        let config = config()
            .distances(vec![NucleotidePair::new(1, 3), NucleotidePair::new(1, 99)])
            .angles(vec![ElementPair::new("s0", "s9"), ElementPair::new("s0", "s1")])
            .build()
            .unwrap();
        let rna = three_way();
        let (row, warnings) = warnings_while(|| run(&rna, 2, &config));
        row.unwrap();

        assert_eq!(warnings.len(), 2, "{:#?}", warnings);
        assert!(warnings.iter().all(|w| w.contains("WARN")));
        assert!(warnings[0].contains(
            "2nd File three_way: Could not calculate distance between 1 and 99: lookup-failed occurred"
        ));
        assert!(warnings[1].contains(
            "2nd File three_way: Could not calculate angle between s0 and s9: lookup-failed occurred"
        ));
    }

    #[test]
    fn pairs_without_3d_data_warn_with_unavailable_kind() {
        let config = config()
            .distances(vec![NucleotidePair::new(1, 7)])
            .angles(vec![ElementPair::new("s0", "h0")])
            .build()
            .unwrap();
        let rna = dotbracket("((...))");
        let (row, warnings) = warnings_while(|| run(&rna, 11, &config));
        let row = row.unwrap();

        assert!(float(&row, "distance_1_7").is_nan());
        assert!(float(&row, "angle_s0_h0").is_nan());
        assert_eq!(warnings.len(), 2, "{:#?}", warnings);
        assert!(warnings[0].contains("11th File db: Could not calculate distance between 1 and 7"));
        assert!(warnings[1].contains("11th File db: Could not calculate angle between s0 and h0"));
        assert!(warnings.iter().all(|w| w.contains("geometry-unavailable occurred")));
    }

    #[test]
    fn descriptor_scope_selects_last_or_all_multiloops() {
        // exterior loop (open) followed by a closed 3-way junction
        let rna = dotbracket("..((...))..(((..(((...)))..(((...)))..)))..");
        let last = run(&rna, 1, &config().build().unwrap()).unwrap();
        let all = run(
            &rna,
            1,
            &config()
                .descriptor_scope(DescriptorScope::AllMultiloops)
                .build()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(int(&last, "total_mls"), 2);
        assert_eq!(int(&last, "open_mls") + int(&last, "regular_mls"), 1);
        assert_eq!(int(&all, "open_mls"), 1);
        assert_eq!(int(&all, "regular_mls"), 1);
    }
}

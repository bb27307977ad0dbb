use crate::core::io::loader::LoadedStructure;
use crate::engine::config::{DescribeConfig, DescribeMode};
use crate::engine::error::EngineError;
use crate::engine::features::FeatureRow;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::table::{NAME_COLUMN, ResultTable};
use crate::engine::tasks::{ml_segments, whole_structure};
use crate::engine::utils::ordinal::ordinal;
use tracing::{error, info, instrument};

pub const FILENAME_COLUMN: &str = "filename";

/// Describes every structure in input order and collects the rows into one table.
///
/// The first structure that fails aborts the run; its error is wrapped with the
/// structure's position and name.
#[instrument(skip_all, name = "describe_workflow")]
pub fn run(
    structures: &[LoadedStructure],
    config: &DescribeConfig,
    reporter: &ProgressReporter,
) -> Result<ResultTable, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Describing structures",
    });
    reporter.report(Progress::TaskStart {
        total_steps: structures.len() as u64,
    });

    let mut table = ResultTable::new();
    for (offset, loaded) in structures.iter().enumerate() {
        let index = offset + 1;
        let name = loaded.rna.name();
        info!("Describing the {} cg {}", ordinal(index), name);
        reporter.report(Progress::StructureStart {
            index,
            name: name.to_string(),
        });

        let rows = describe_structure(loaded, index, config).map_err(|source| {
            error!("Error occurred during describing {} cg {}", ordinal(index), name);
            EngineError::Structure {
                ordinal: ordinal(index),
                name: name.to_string(),
                source: Box::new(source),
            }
        })?;
        for row in rows {
            table.push(row)?;
        }
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(
        "Described {} structure(s) into {} row(s).",
        structures.len(),
        table.len()
    );
    Ok(table)
}

fn describe_structure(
    loaded: &LoadedStructure,
    index: usize,
    config: &DescribeConfig,
) -> Result<Vec<FeatureRow>, EngineError> {
    let with_keys = |features: FeatureRow| {
        let mut row = FeatureRow::new();
        row.set(NAME_COLUMN, loaded.rna.name());
        row.set(FILENAME_COLUMN, loaded.filename.as_str());
        row.merge(features);
        row
    };

    match config.mode {
        DescribeMode::WholeStructure => {
            let features = whole_structure::run(&loaded.rna, index, config)?;
            Ok(vec![with_keys(features)])
        }
        DescribeMode::PerMultiloopSegment => Ok(ml_segments::run(&loaded.rna)?
            .into_iter()
            .map(with_keys)
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::dotbracket::DotBracketFile;
    use crate::core::io::traits::RnaFile;
    use crate::engine::config::DescribeConfigBuilder;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn load(content: &str) -> Vec<LoadedStructure> {
        DotBracketFile::read_from(&mut Cursor::new(content), "db")
            .unwrap()
            .into_iter()
            .map(|rna| LoadedStructure {
                rna,
                filename: "input.db".to_string(),
            })
            .collect()
    }

    fn config(mode: DescribeMode) -> DescribeConfig {
        DescribeConfigBuilder::new().mode(mode).build().unwrap()
    }

    #[test]
    fn whole_structure_mode_yields_one_row_per_structure() {
        let structures = load(">a\n((...))\n>b\n..((..((...))..))..\n");
        let table = run(
            &structures,
            &config(DescribeMode::WholeStructure),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(&table.columns()[..3], &["name", "filename", "nt_length"]);
        assert_eq!(table.rows()[1].get("name").unwrap().to_string(), "b");
    }

    #[test]
    fn per_segment_mode_without_3d_data_aborts_with_context() {
        let structures = load(">junction\n(((..(((...)))..(((...)))..)))\n");
        let err = run(
            &structures,
            &config(DescribeMode::PerMultiloopSegment),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        match err {
            EngineError::Structure { ordinal, name, .. } => {
                assert_eq!(ordinal, "1st");
                assert_eq!(name, "junction");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn per_segment_mode_skips_structures_without_segments() {
        let structures = load(">hairpin\n((...))\n");
        let table = run(
            &structures,
            &config(DescribeMode::PerMultiloopSegment),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn progress_counts_every_structure() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter =
            ProgressReporter::with_callback(Box::new(move |e| sink.lock().unwrap().push(e)));
        let structures = load(">a\n((...))\n>b\n((....))\n");
        run(&structures, &config(DescribeMode::WholeStructure), &reporter).unwrap();

        let events = events.lock().unwrap();
        let increments = events
            .iter()
            .filter(|e| matches!(e, Progress::TaskIncrement))
            .count();
        assert_eq!(increments, 2);
        assert!(events.contains(&Progress::StructureStart {
            index: 2,
            name: "b".into()
        }));
    }
}

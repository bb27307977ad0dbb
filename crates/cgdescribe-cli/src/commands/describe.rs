use crate::cli::Cli;
use crate::config::PartialDescribeConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use cgdescribe::{core::io::loader, engine::progress::ProgressReporter, workflows};
use std::io::Write;
use tracing::info;

pub fn run(cli: &Cli) -> Result<()> {
    let partial_config = PartialDescribeConfig::load(cli.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(cli)?;

    info!("Loading {} input file(s)", cli.inputs.len());
    let structures = loader::load_all(&cli.inputs)?;
    info!("Loaded {} structure(s).", structures.len());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core describe workflow...");
    let mut table = workflows::describe::run(&structures, &config.describe, &reporter)?;

    if let Some(keys) = &config.keys {
        info!("Keeping columns {:?} (plus name).", keys);
        table.retain_columns(keys);
    }

    match &config.csv {
        Some(path) => {
            info!("Writing {} row(s) to {:?}", table.len(), path);
            table.write_csv(path, config.mode)?;
            if !table.is_empty() {
                eprintln!("✓ {} row(s) written to: {}", table.len(), path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(table.render_text().as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

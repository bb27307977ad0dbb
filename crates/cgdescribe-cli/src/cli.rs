use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "describe-cg",
    author,
    version,
    about = "Collect descriptive statistics for coarse-grained RNA structures: element counts, multiloop classification, shape metrics and selected distances and angles.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    // --- Input ---
    /// One or more RNA files (.cg, .coord, .fa, .fasta, .db, .dbn, .dotbracket).
    /// Files with other extensions are recognized by their content.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Output ---
    /// Store the table in a CSV file instead of printing it to stdout.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Only output the listed columns (comma separated). The 'name' column is always kept.
    #[arg(short, long, value_name = "LIST", value_delimiter = ',')]
    pub keys: Option<Vec<String>>,

    /// What to do with an existing CSV file: 'a' appends, 'o' overwrites.
    /// Without it an existing file is an error.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    // --- Features ---
    /// Angles between element pairs, e.g. 's0,s1:s1,h0'.
    #[arg(long, value_name = "PAIRS")]
    pub angles: Option<String>,

    /// Distances between nucleotide pairs (1-based), e.g. '1,20:2,19'.
    #[arg(long, value_name = "PAIRS")]
    pub distances: Option<String>,

    /// Describe every multiloop segment instead of the whole structure.
    #[arg(long)]
    pub per_ml: bool,

    /// Count multiloop descriptors over all multiloops instead of the last one only.
    #[arg(long)]
    pub aggregate_descriptors: bool,

    // --- Logging ---
    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

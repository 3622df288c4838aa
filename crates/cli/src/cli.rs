use clap::Parser;
use std::path::PathBuf;

use rekonvert_core::OutputFormat;

#[derive(Parser)]
#[command(name = "rekonvert")]
#[command(author, version, about = "Convert a media tree into a mirrored output tree")]
pub struct Cli {
    /// Source directory (or source file with --single-file)
    #[arg(short, long, default_value = ".")]
    pub target: PathBuf,

    /// Output directory (or output file with --single-file)
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Output format
    #[arg(short = 'f', long, default_value = "m4a", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Skip files whose destination already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Copy non-convertible files into the output tree as well
    #[arg(long)]
    pub copy_all: bool,

    /// Convert a single file instead of scanning a tree
    #[arg(long)]
    pub single_file: bool,

    /// Worker pool size; 0 converts in-process, one file at a time
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Resume an interrupted run without prompting
    #[arg(long, conflicts_with = "fresh")]
    pub resume: bool,

    /// Discard any interrupted run and start fresh without prompting
    #[arg(long)]
    pub fresh: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

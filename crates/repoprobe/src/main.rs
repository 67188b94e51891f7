use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use repoprobe::app::report::{OutputFormat, ReportOptions, Reporter};
use repoprobe::app::snapshot;
use repoprobe::infra::config::Config;

#[derive(Parser)]
#[command(author, version, about = "Report git repository state for debug panels", long_about = None)]
struct Cli {
    /// Directory to probe; defaults to the current working directory.
    path: Option<PathBuf>,

    /// Output format override.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() -> Result<()> {
    repoprobe::init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let start = match cli.path {
        Some(path) => path,
        None => env::current_dir().context("unable to determine working directory")?,
    };

    let captured = snapshot::capture(&start);

    let mut options = ReportOptions::from_config(&config);
    if let Some(format) = cli.format {
        options.format = format;
    }

    let reporter = Reporter::new()?;
    println!("{}", reporter.render(&captured, &options)?);
    Ok(())
}

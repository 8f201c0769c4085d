use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;

use pascal_voc_fetch::output::{self, TextOutput};
use pascal_voc_fetch::paths;

#[derive(Parser)]
#[command(name = "voc-data-dir")]
#[command(about = "Print the data/raw/archive directory next to this tool's parent directory")]
#[command(version)]
struct Cli {}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    output::init_tracing();

    let _cli = Cli::parse();

    let base = paths::executable_dir();
    let data_dir = paths::resolve_data_dir(base.as_deref())?;
    TextOutput::print_data_dir(&data_dir).into_diagnostic()?;
    Ok(())
}

use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;

use pascal_voc_fetch::app::Fetcher;
use pascal_voc_fetch::config::FetchSettings;
use pascal_voc_fetch::kaggle::KaggleHttpClient;
use pascal_voc_fetch::output::{self, LogSink, TextOutput};

#[derive(Parser)]
#[command(name = "voc-download")]
#[command(about = "Download PASCAL VOC 2007 from the Kaggle hub into data/processed")]
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

    let provider = KaggleHttpClient::new()?;
    let fetcher = Fetcher::new(provider, FetchSettings::default());
    let report = fetcher.fetch_and_place(&LogSink)?;
    TextOutput::print_fetch(&report).into_diagnostic()?;
    Ok(())
}

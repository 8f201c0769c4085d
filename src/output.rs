use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{EventLevel, FetchReport, ProgressEvent, ProgressSink};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the stderr subscriber shared by the binaries. `RUST_LOG`
/// overrides [`DEFAULT_LOG_FILTER`].
pub fn init_tracing() {
    let directives = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Forwards progress events to `tracing`.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match (event.level, event.elapsed) {
            (EventLevel::Info, Some(elapsed)) => {
                info!(latency_ms = latency_ms(elapsed), "{}", event.message)
            }
            (EventLevel::Info, None) => info!("{}", event.message),
            (EventLevel::Warn, _) => warn!("{}", event.message),
        }
    }
}

fn latency_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_fetch(report: &FetchReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", report.target_dir.display())?;
        if !report.is_complete() {
            writeln!(stdout, "missing: {}", report.missing_files.join(", "))?;
        }
        Ok(())
    }

    pub fn print_data_dir(path: &Path) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", path.display())
    }
}

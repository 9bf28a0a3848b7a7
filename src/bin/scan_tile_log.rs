use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use transient_serve::batch::tile_log::{self, DEFAULT_OUTPUT};
use transient_serve::logger::{self, writer, LogLevel};

#[derive(Parser)]
#[command(name = "scan-tile-log")]
#[command(about = "Collect tile-overflow warnings from a tiling log into a CSV", long_about = None)]
struct Cli {
    /// Build log to scan (e.g. joblog_pmtiles.txt)
    log: PathBuf,

    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        let _ = writer::init(LogLevel::Debug, None, None);
    }

    match tile_log::run(&cli.log, &cli.output) {
        Ok(0) => {
            logger::log_info("No tiles over threshold found.");
            ExitCode::SUCCESS
        }
        Ok(count) => {
            logger::log_info(&format!(
                "Wrote {count} offending tiles to {}",
                cli.output.display()
            ));
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use transient_serve::batch::manifest::{self, ManifestOptions, DEFAULT_BASE_URL};
use transient_serve::logger::{self, writer, LogLevel};

#[derive(Parser)]
#[command(name = "gen-downloadable")]
#[command(about = "Generate DOWNLOADABLE.md for parts/*.fgb and data/*.fgb", long_about = None)]
struct Cli {
    /// Directory holding data/ and parts/
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Public host the listed links point to
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Output file [default: <root>/DOWNLOADABLE.md]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use local file metadata only, without HEAD requests
    #[arg(long)]
    no_probe: bool,

    /// HEAD request timeout in seconds
    #[arg(long, default_value_t = 8)]
    timeout: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        let _ = writer::init(LogLevel::Debug, None, None);
    }

    let mut options = ManifestOptions::new(cli.root);
    options.base_url = cli.base_url;
    options.probe = !cli.no_probe;
    options.probe_timeout = Duration::from_secs(cli.timeout);
    if let Some(output) = cli.output {
        options.output = output;
    }

    match manifest::run(&options).await {
        Ok(count) => {
            logger::log_info(&format!(
                "Wrote {} ({count} files)",
                options.output.display()
            ));
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

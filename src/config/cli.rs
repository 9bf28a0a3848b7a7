// Command line surface of the server binary

use clap::Parser;

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "transient-serve")]
#[command(about = "Serve data and parts directories", long_about = None)]
pub struct Cli {
    /// Address to bind [default: 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding data/ and parts/ [default: .]
    #[arg(long)]
    pub dir: Option<String>,

    /// If set, add Access-Control-Allow-Origin headers. Example: "https://transient.optgeo.org"
    #[arg(long)]
    pub cors_origin: Option<String>,

    /// Configuration file (TOML), extension optional
    #[arg(long, default_value = "transient")]
    pub config: String,

    /// Tokio worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// error, warn, info or debug
    #[arg(long)]
    pub log_level: Option<String>,

    /// Disable per-request access logging
    #[arg(long)]
    pub no_access_log: bool,
}

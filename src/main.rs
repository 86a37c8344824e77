use std::io;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use dunkmaster_stats::config;
use dunkmaster_stats::rpc;
use dunkmaster_stats::tables::TableCache;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    config::load_dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let data_dir = config::resolve_data_dir(&args)?;
    tracing::info!(data_dir = %data_dir.display(), "serving stats tools over stdio");

    let cache = TableCache::new(data_dir);
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    rpc::serve(&cache, stdin, stdout)
}

/// Logs go to stderr; stdout belongs to the JSON-RPC stream.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

mod app;
mod cli;
mod commands;
mod types;
mod util;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Log filter from `KANJISET_LOG`, then `RUST_LOG`, then `info`. Logs go to
/// stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KANJISET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = cli::Cli::parse();
    app::run(cli)
}

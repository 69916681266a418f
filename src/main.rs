use clap::Parser;
use tracing_subscriber::EnvFilter;

use murmur::cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MURMUR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = murmur::run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

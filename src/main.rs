use clap::Parser;
use tracing_subscriber::EnvFilter;

use proto_mirror::{run, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Errors are reported inside run(); main only sets the exit code.
    if run(cli).await.is_err() {
        std::process::exit(1);
    }
}

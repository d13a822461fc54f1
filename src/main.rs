use clap::Parser;
use tracing::{info, Level};

use vidfolio::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting vidfolio v{}", env!("CARGO_PKG_VERSION"));

    cli.run().await
}

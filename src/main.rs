use anyhow::Result;
use clap::Parser;
use ratesd::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,

    /// Listening port; overrides PORT and the configuration file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|value| value.parse().ok()));

    let result = ratesd::run(cli.config_path.as_deref(), port).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

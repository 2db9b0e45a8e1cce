use clap::Parser;

mod cli;
mod commands;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("ltl error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = lintel_config::LintelConfig::load_with_dotenv()?;
    init_tracing(cli.quiet, cli.verbose, &config.general.log)?;

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| config.database.path.clone());

    match &cli.command {
        cli::Commands::Sync(args) => commands::sync(&db_path, args).await,
        cli::Commands::Repos => commands::repos(&db_path).await,
        cli::Commands::Rules(args) => commands::rules(&db_path, args).await,
    }
}

fn init_tracing(quiet: bool, verbose: bool, configured: &str) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        configured
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LINTEL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

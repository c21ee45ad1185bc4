mod cmd;

use caviz::config::ConfigManager;
use caviz::error;
use clap::{Parser, Subcommand};
use cmd::source::Context;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "caviz",
    about = "Visualize and evaluate Entra ID Conditional Access policies",
    version,
    long_about = "Export Conditional Access policies as a node/edge graph and check which\n\
                  policies apply to a user through their direct and transitive group memberships."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Microsoft Graph access token (falls back to CAVIZ_ACCESS_TOKEN, then the config .env file)
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the policy graph as JSON
    Graph(cmd::graph::GraphArgs),

    /// Show which policies apply to a user
    Evaluate(cmd::evaluate::EvaluateArgs),

    /// Search directory users by name or UPN
    Search(cmd::search::SearchArgs),

    /// List Conditional Access policies
    Policies(cmd::policies::ListArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(cmd::config::ConfigCommands),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, config: &ConfigManager) {
    let filter = if verbose {
        EnvFilter::new("caviz=debug")
    } else {
        let level = config
            .load_config()
            .map(|c| c.log_level)
            .unwrap_or_else(|_| "warn".to_string());
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(format!("caviz={}", level)))
            .unwrap_or_else(|_| EnvFilter::new("caviz=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> error::Result<()> {
    let cli = Cli::parse();
    let config = ConfigManager::new()?;

    init_logging(cli.verbose, &config);

    let ctx = Context {
        config,
        token: cli.token,
    };

    match cli.command {
        Commands::Graph(args) => cmd::graph::export(&ctx, args).await?,
        Commands::Evaluate(args) => cmd::evaluate::evaluate(&ctx, args).await?,
        Commands::Search(args) => cmd::search::search(&ctx, args).await?,
        Commands::Policies(args) => cmd::policies::list(&ctx, args).await?,
        Commands::Config(config_cmd) => cmd::config::run(&ctx, config_cmd)?,
    }

    Ok(())
}

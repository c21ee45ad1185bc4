use super::source::Context;
use caviz::config::{Config, TOKEN_ENV_VAR};
use caviz::error::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the config directory
    Path,

    /// Write a default config.toml
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

pub fn run(ctx: &Context, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config.config_dir().display());
            Ok(())
        }
        ConfigCommands::Init(args) => init(ctx, args),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let config = ctx.config.load_config()?;
    let token_source = if ctx.token.is_some() {
        "--token flag".to_string()
    } else if std::env::var(TOKEN_ENV_VAR).is_ok() {
        TOKEN_ENV_VAR.to_string()
    } else if ctx.config.env_file().exists() {
        ctx.config.env_file().display().to_string()
    } else {
        "none".red().to_string()
    };

    println!("{}", "Configuration".cyan().bold());
    println!("  File:           {}", ctx.config.config_file().display());
    println!("  Tenant:         {}", config.tenant_id.as_deref().unwrap_or("-"));
    println!("  Log level:      {}", config.log_level);
    println!("  Token source:   {}", token_source);
    println!("\n{}", "Graph".cyan().bold());
    println!("  Base URL:       {}", config.graph.base_url);
    println!("  Max retries:    {}", config.graph.max_retries);
    println!(
        "  Backoff:        {}ms initial, {}ms max",
        config.graph.initial_backoff_ms, config.graph.max_backoff_ms
    );
    println!("  Timeout:        {}s", config.graph.timeout_secs);
    println!("  Search limit:   {}", config.graph.search_limit);

    Ok(())
}

fn init(ctx: &Context, args: InitArgs) -> Result<()> {
    let path = ctx.config.config_file();
    if path.exists() && !args.force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "!".yellow(),
            path.display()
        );
        return Ok(());
    }

    ctx.config.save_config(&Config::default())?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

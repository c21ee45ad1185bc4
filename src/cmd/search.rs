use super::pad;
use super::progress;
use super::source::Context;
use caviz::error::Result;
use caviz::graph::directory;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Prefix of the user's display name or UPN
    pub query: String,

    /// Maximum number of results (defaults to graph.search_limit)
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn search(ctx: &Context, args: SearchArgs) -> Result<()> {
    let graph = ctx.graph_client()?;
    let limit = args.limit.unwrap_or(graph.settings().search_limit);

    let users = progress::with_spinner(
        progress::create_spinner(&format!("Searching users for '{}'...", args.query)),
        "User search failed",
        directory::search_users(&graph, &args.query, limit),
        |_| None,
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("{} No users match '{}'", "ℹ".yellow(), args.query);
        return Ok(());
    }

    println!(
        "{} {} {}",
        pad("Name", 32).bold(),
        pad("UPN", 40).bold(),
        "ID".bold()
    );
    println!("{}", "─".repeat(110));

    for user in &users {
        println!(
            "{:<32} {:<40} {}",
            user.display_name,
            user.user_principal_name.as_deref().unwrap_or("-"),
            user.id.dimmed()
        );
    }

    println!(
        "\n{} Evaluate with: caviz evaluate --user <ID>",
        "→".cyan()
    );

    Ok(())
}

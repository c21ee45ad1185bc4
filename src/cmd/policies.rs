//! Conditional Access policy listing

use super::source::{self, Context, PolicySourceArgs};
use super::{pad, state_display, truncate_name};
use caviz::error::{CavizError, Result};
use caviz::graph::conditional_access;
use caviz::policy::{self, ConditionalAccessPolicy, PolicyState};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: PolicySourceArgs,

    /// Show ids, conditions and grant controls
    #[arg(short, long)]
    pub details: bool,

    /// Filter by state (enabled, report-only, disabled)
    #[arg(long)]
    pub state: Option<String>,

    /// Show a single policy by id
    #[arg(long, conflicts_with = "state")]
    pub id: Option<String>,
}

/// List Conditional Access policies
pub async fn list(ctx: &Context, args: ListArgs) -> Result<()> {
    if let Some(id) = &args.id {
        let policy = find_policy(ctx, &args.source, id).await?;
        print_policy(&policy, true);
        return Ok(());
    }

    let policies = source::load_policies(ctx, &args.source).await?;

    if policies.is_empty() {
        println!("\n{} No Conditional Access policies found", "ℹ".yellow());
        return Ok(());
    }

    let count = |state: PolicyState| policies.iter().filter(|p| p.state == state).count();
    println!(
        "\n{} {} CA policies found ({} enabled, {} report-only, {} disabled)\n",
        "→".cyan(),
        policies.len(),
        count(PolicyState::Enabled).to_string().green(),
        count(PolicyState::ReportOnly).to_string().yellow(),
        count(PolicyState::Disabled).to_string().red()
    );

    let filter = args.state.as_deref().map(PolicyState::from_filter);
    let filtered: Vec<&ConditionalAccessPolicy> = policies
        .iter()
        .filter(|p| filter.as_ref().map_or(true, |f| &p.state == f))
        .collect();

    println!(
        "{} {} {}",
        pad("Name", 50).bold(),
        pad("State", 15).bold(),
        "Created".bold()
    );
    println!("{}", "─".repeat(80));

    for policy in filtered {
        print_policy(policy, args.details);
    }

    Ok(())
}

async fn find_policy(
    ctx: &Context,
    source: &PolicySourceArgs,
    id: &str,
) -> Result<ConditionalAccessPolicy> {
    match &source.policies {
        Some(path) => policy::load_policies_file(path)?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CavizError::InvalidInput(format!("no policy with id '{}' in {}", id, path.display()))),
        None => {
            let graph = ctx.graph_client()?;
            conditional_access::get_policy(&graph, id).await
        }
    }
}

fn date_part(value: &Option<String>) -> &str {
    value
        .as_deref()
        .unwrap_or("")
        .split('T')
        .next()
        .unwrap_or("")
}

fn print_list(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("   {}: {}", label, values.join(", ").dimmed());
    }
}

fn print_policy(policy: &ConditionalAccessPolicy, details: bool) {
    println!(
        "{:<50} {} {}",
        truncate_name(&policy.display_name, 48),
        state_display(&policy.state, 15),
        date_part(&policy.created_date_time)
    );

    if details {
        let users = policy.users();
        println!("   ID: {}", policy.id.dimmed());
        println!("   Modified: {}", date_part(&policy.modified_date_time).dimmed());
        print_list("Include users", &users.include_users);
        print_list("Include groups", &users.include_groups);
        print_list("Exclude users", &users.exclude_users);
        print_list("Exclude groups", &users.exclude_groups);
        print_list("Grant controls", policy.built_in_controls());
        println!();
    }
}

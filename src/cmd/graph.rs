//! Policy graph export for the visualization front-end

use super::source::{self, Context, PolicySourceArgs, Subject};
use caviz::analysis::{self, NodeKind};
use caviz::error::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub source: PolicySourceArgs,

    /// Write the graph JSON to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only keep the policies that apply to this user (id or UPN) and their neighbours
    #[arg(long, value_name = "USER")]
    pub focus_user: Option<String>,

    /// Group id the focus user belongs to (repeatable; skips the membership lookup)
    #[arg(long = "group", value_name = "GROUP_ID", requires = "focus_user")]
    pub groups: Vec<String>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn export(ctx: &Context, args: GraphArgs) -> Result<()> {
    let policies = source::load_policies(ctx, &args.source).await?;
    let mut graph = analysis::normalize_policies(&policies);

    if let Some(user) = &args.focus_user {
        let subject = if args.source.is_offline() {
            Subject::offline(user, &args.groups)
        } else {
            let client = ctx.graph_client()?;
            source::lookup_subject(&client, user, &args.groups).await?
        };

        let applicable =
            analysis::applicable_policy_ids(&policies, &subject.user_id, &subject.group_ids);
        eprintln!(
            "{} {} of {} policies apply to {}",
            "→".cyan(),
            applicable.len(),
            policies.len(),
            subject.label().bold()
        );
        graph = graph.focus(&applicable);
    }

    let json = if args.compact {
        serde_json::to_string(&graph)?
    } else {
        serde_json::to_string_pretty(&graph)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!(
                "{} Graph written to {} ({} policies, {} conditions, {} controls, {} edges)",
                "✓".green(),
                path.display(),
                graph.count_kind(NodeKind::Policy),
                graph.count_kind(NodeKind::Condition),
                graph.count_kind(NodeKind::Control),
                graph.edges.len()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

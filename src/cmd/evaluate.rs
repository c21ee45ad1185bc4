//! What-if evaluation: which policies apply to a user

use super::progress;
use super::{pad, state_display, truncate_name};
use super::source::{self, Context, PolicySourceArgs, Subject};
use caviz::analysis::{self, PolicyEvaluation};
use caviz::error::{CavizError, Result};
use caviz::policy::{ConditionalAccessPolicy, PolicyState};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// User object id or UPN to evaluate (repeatable)
    #[arg(short, long = "user", value_name = "USER", required = true)]
    pub users: Vec<String>,

    #[command(flatten)]
    pub source: PolicySourceArgs,

    /// Group id the user belongs to (repeatable; replaces the membership lookup)
    #[arg(long = "group", value_name = "GROUP_ID")]
    pub groups: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Show the deciding rule for every policy, including those that don't apply
    #[arg(long)]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
struct UserReport {
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    applicable_policy_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluations: Option<Vec<PolicyEvaluation>>,
}

async fn resolve_subjects(ctx: &Context, args: &EvaluateArgs) -> Result<(Vec<ConditionalAccessPolicy>, Vec<Subject>)> {
    if args.source.is_offline() {
        let policies = source::load_policies(ctx, &args.source).await?;
        let subjects = args
            .users
            .iter()
            .map(|u| Subject::offline(u, &args.groups))
            .collect();
        return Ok((policies, subjects));
    }

    let graph = ctx.graph_client()?;
    // Both lines draw concurrently, so they share one MultiProgress
    let multi = progress::create_multi_progress();

    let lookups = async {
        let bar = progress::create_user_bar(&multi, args.users.len() as u64);
        let mut subjects = Vec::with_capacity(args.users.len());
        for user in &args.users {
            subjects.push(source::lookup_subject(&graph, user, &args.groups).await?);
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok::<_, CavizError>(subjects)
    };

    tokio::try_join!(source::fetch_policies(&graph, Some(&multi)), lookups)
}

pub async fn evaluate(ctx: &Context, args: EvaluateArgs) -> Result<()> {
    let (policies, subjects) = resolve_subjects(ctx, &args).await?;

    let reports: Vec<(Subject, Vec<PolicyEvaluation>)> = subjects
        .into_iter()
        .map(|subject| {
            let evaluations =
                analysis::evaluate_policies(&policies, &subject.user_id, &subject.group_ids);
            (subject, evaluations)
        })
        .collect();

    if args.json {
        let json_reports: Vec<UserReport> = reports
            .iter()
            .map(|(subject, evaluations)| UserReport {
                user_id: subject.user_id.clone(),
                display_name: subject.display_name.clone(),
                applicable_policy_ids: evaluations
                    .iter()
                    .filter(|e| e.applies)
                    .map(|e| e.policy_id.clone())
                    .collect(),
                evaluations: args.explain.then(|| evaluations.clone()),
            })
            .collect();

        // A single user keeps the {"applicable_policy_ids": [...]} object shape
        let json = match json_reports.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        println!("{}", json);
        return Ok(());
    }

    for (subject, evaluations) in &reports {
        print_report(subject, evaluations, args.explain);
    }

    Ok(())
}

fn print_report(subject: &Subject, evaluations: &[PolicyEvaluation], explain: bool) {
    println!(
        "\n{} {} ({} groups)",
        "Evaluating".cyan().bold(),
        subject.label().bold(),
        subject.group_ids.len()
    );

    let applicable: Vec<&PolicyEvaluation> = evaluations.iter().filter(|e| e.applies).collect();
    let report_only = applicable
        .iter()
        .filter(|e| e.state == PolicyState::ReportOnly)
        .count();

    println!(
        "{} {} of {} policies apply ({} report-only)\n",
        "→".cyan(),
        applicable.len().to_string().green(),
        evaluations.len(),
        report_only.to_string().yellow()
    );

    if applicable.is_empty() && !explain {
        println!("{} No policies apply to this user", "ℹ".yellow());
        return;
    }

    println!("{} {} {}", pad("", 3), pad("Name", 50).bold(), "State".bold());
    println!("{}", "─".repeat(70));

    for evaluation in evaluations.iter().filter(|e| explain || e.applies) {
        let mark = if evaluation.applies {
            pad("✓", 3).green()
        } else {
            pad("✗", 3).red()
        };

        println!(
            "{} {:<50} {}",
            mark,
            truncate_name(&evaluation.display_name, 48),
            state_display(&evaluation.state, 15)
        );

        if explain {
            println!("    {}", evaluation.decision.to_string().dimmed());
        }
    }
}

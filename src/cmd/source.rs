//! Where commands get their data: Microsoft Graph or an offline export

use super::progress;
use caviz::config::ConfigManager;
use caviz::error::Result;
use caviz::graph::{conditional_access, directory, GraphClient};
use caviz::policy::{self, ConditionalAccessPolicy};
use clap::Args;
use indicatif::MultiProgress;
use std::collections::HashSet;
use std::path::PathBuf;

const FETCH_MESSAGE: &str = "Fetching Conditional Access policies...";

/// Shared state for every command
pub struct Context {
    pub config: ConfigManager,
    pub token: Option<String>,
}

impl Context {
    pub fn graph_client(&self) -> Result<GraphClient> {
        GraphClient::from_config(&self.config, self.token.as_deref())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PolicySourceArgs {
    /// Read policies from a JSON export instead of Microsoft Graph
    #[arg(long, value_name = "FILE")]
    pub policies: Option<PathBuf>,
}

impl PolicySourceArgs {
    pub fn is_offline(&self) -> bool {
        self.policies.is_some()
    }
}

/// Load policies from the export file, or fetch them with a spinner
pub async fn load_policies(
    ctx: &Context,
    source: &PolicySourceArgs,
) -> Result<Vec<ConditionalAccessPolicy>> {
    if let Some(path) = &source.policies {
        return policy::load_policies_file(path);
    }

    let graph = ctx.graph_client()?;
    fetch_policies(&graph, None).await
}

/// Fetch policies from Graph behind a spinner, inside `multi` when other bars are live
pub async fn fetch_policies(
    graph: &GraphClient,
    multi: Option<&MultiProgress>,
) -> Result<Vec<ConditionalAccessPolicy>> {
    let spinner = match multi {
        Some(multi) => progress::create_spinner_in(multi, FETCH_MESSAGE),
        None => progress::create_spinner(FETCH_MESSAGE),
    };

    progress::with_spinner(
        spinner,
        "Failed to fetch policies",
        conditional_access::list_policies(graph),
        |policies| Some(format!("Fetched {} Conditional Access policies", policies.len())),
    )
    .await
}

/// A user to evaluate, with resolved id and transitive groups
#[derive(Debug, Clone)]
pub struct Subject {
    pub user_id: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub group_ids: HashSet<String>,
}

impl Subject {
    /// User given on the command line without a directory lookup
    pub fn offline(user_id: &str, groups: &[String]) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: None,
            user_principal_name: None,
            group_ids: groups.iter().cloned().collect(),
        }
    }

    pub fn label(&self) -> String {
        match (&self.display_name, &self.user_principal_name) {
            (Some(name), Some(upn)) => format!("{} ({})", name, upn),
            (Some(name), None) => name.clone(),
            _ => self.user_id.clone(),
        }
    }
}

/// Resolve a user id or UPN and their transitive groups from Graph
///
/// Groups given explicitly replace the directory lookup.
pub async fn lookup_subject(graph: &GraphClient, user: &str, groups: &[String]) -> Result<Subject> {
    let (resolved, group_ids) = if groups.is_empty() {
        tokio::try_join!(
            directory::get_user(graph, user),
            directory::transitive_group_ids(graph, user)
        )?
    } else {
        (directory::get_user(graph, user).await?, groups.to_vec())
    };

    Ok(Subject {
        user_id: resolved.id,
        display_name: Some(resolved.display_name),
        user_principal_name: resolved.user_principal_name,
        group_ids: group_ids.into_iter().collect(),
    })
}

//! Conditional Access policy retrieval via Microsoft Graph

use crate::error::Result;
use crate::graph::GraphClient;
use crate::policy::ConditionalAccessPolicy;

pub const POLICIES_ENDPOINT: &str = "identity/conditionalAccess/policies";

/// List all Conditional Access policies, following pagination
pub async fn list_policies(client: &GraphClient) -> Result<Vec<ConditionalAccessPolicy>> {
    client.get_all_pages(POLICIES_ENDPOINT).await
}

/// Get a specific CA policy by ID
pub async fn get_policy(client: &GraphClient, policy_id: &str) -> Result<ConditionalAccessPolicy> {
    client
        .get(&format!("{}/{}", POLICIES_ENDPOINT, urlencoding::encode(policy_id)))
        .await
}

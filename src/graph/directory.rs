//! Directory lookups: user search, user resolution and transitive group membership

use crate::error::{CavizError, Result};
use crate::graph::GraphClient;
use serde::{Deserialize, Serialize};

const GROUP_ODATA_TYPE: &str = "#microsoft.graph.group";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

/// Member of a `transitiveMemberOf` collection (groups, roles, admin units)
#[derive(Debug, Deserialize)]
struct DirectoryObject {
    id: String,
    #[serde(rename = "@odata.type", default)]
    odata_type: Option<String>,
}

impl DirectoryObject {
    fn is_group(&self) -> bool {
        self.odata_type
            .as_deref()
            .is_some_and(|t| t.contains(GROUP_ODATA_TYPE))
    }
}

/// Escape a value for use inside an OData single-quoted string literal
fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Search users whose display name or UPN starts with `query`
pub async fn search_users(client: &GraphClient, query: &str, limit: u32) -> Result<Vec<GraphUser>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CavizError::InvalidInput("search query must not be empty".into()));
    }

    let q = urlencoding::encode(&odata_quote(query)).into_owned();
    let endpoint = format!(
        "users?$filter=startswith(displayName,'{q}') or startswith(userPrincipalName,'{q}')&$top={limit}&$select=id,displayName,userPrincipalName"
    );

    // One page is enough; $top already bounds the result
    client.get_pages_limited(&endpoint, 1).await
}

/// Resolve a user by object id or user principal name
///
/// The value is percent-encoded as a path segment; guest UPNs carry `#EXT#`.
pub async fn get_user(client: &GraphClient, id_or_upn: &str) -> Result<GraphUser> {
    let endpoint = format!(
        "users/{}?$select=id,displayName,userPrincipalName",
        urlencoding::encode(id_or_upn)
    );
    client.get(&endpoint).await.map_err(|e| match e {
        CavizError::GraphApiError(msg) if msg.starts_with("HTTP 404") => {
            CavizError::UserNotFound(id_or_upn.to_string())
        }
        other => other,
    })
}

/// Ids of every group the user belongs to, including through nested groups
///
/// Directory roles and administrative units in the response are skipped.
pub async fn transitive_group_ids(client: &GraphClient, user_id: &str) -> Result<Vec<String>> {
    let members: Vec<DirectoryObject> = client
        .get_all_pages(&format!(
            "users/{}/transitiveMemberOf?$select=id",
            urlencoding::encode(user_id)
        ))
        .await?;

    let groups: Vec<String> = members
        .into_iter()
        .filter(DirectoryObject::is_group)
        .map(|m| m.id)
        .collect();

    tracing::debug!("User {} is a transitive member of {} groups", user_id, groups.len());
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odata_quote() {
        assert_eq!(odata_quote("o'brien"), "o''brien");
        assert_eq!(odata_quote("plain"), "plain");
    }

    #[test]
    fn test_directory_object_group_filter() {
        let items: Vec<DirectoryObject> = serde_json::from_value(serde_json::json!([
            {"@odata.type": "#microsoft.graph.group", "id": "g1"},
            {"@odata.type": "#microsoft.graph.directoryRole", "id": "r1"},
            {"id": "unknown"}
        ]))
        .unwrap();

        let groups: Vec<&str> = items
            .iter()
            .filter(|i| i.is_group())
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(groups, vec!["g1"]);
    }
}

//! Conditional Access policy records as returned by Microsoft Graph
//!
//! Only the user/group conditions and grant controls are typed; the other
//! condition kinds are carried as opaque JSON. Absent and `null` collections
//! both deserialize to empty ones, so the analysis code never sees an `Option`
//! around a list.

use crate::error::{CavizError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Sentinel in `includeUsers` meaning every user in the tenant
pub const ALL_USERS: &str = "All";

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyState {
    Enabled,
    Disabled,
    /// `enabledForReportingButNotEnforced` (also read as `enabled_for_reporting_only`)
    ReportOnly,
    /// Any state string Graph may add later, kept verbatim
    Other(String),
}

impl PolicyState {
    pub fn as_str(&self) -> &str {
        match self {
            PolicyState::Enabled => "enabled",
            PolicyState::Disabled => "disabled",
            PolicyState::ReportOnly => "enabledForReportingButNotEnforced",
            PolicyState::Other(s) => s,
        }
    }

    /// Short name used in CLI output and filters
    pub fn short_name(&self) -> &str {
        match self {
            PolicyState::ReportOnly => "report-only",
            other => other.as_str(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, PolicyState::Disabled)
    }

    /// Parse a CLI filter value (`enabled`, `report-only`, `disabled`, or a raw Graph state)
    pub fn from_filter(filter: &str) -> Self {
        match filter {
            "report-only" | "reportonly" => PolicyState::ReportOnly,
            other => PolicyState::from(other.to_string()),
        }
    }
}

impl From<String> for PolicyState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "enabled" => PolicyState::Enabled,
            "disabled" => PolicyState::Disabled,
            "enabledForReportingButNotEnforced" | "enabled_for_reporting_only" => PolicyState::ReportOnly,
            _ => PolicyState::Other(s),
        }
    }
}

impl From<PolicyState> for String {
    fn from(state: PolicyState) -> Self {
        match state {
            PolicyState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PolicyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalAccessPolicy {
    pub id: String,
    pub display_name: String,
    pub state: PolicyState,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub modified_date_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: PolicyConditions,
    #[serde(default)]
    pub grant_controls: Option<GrantControls>,
    #[serde(default)]
    pub session_controls: Option<Value>,
}

impl ConditionalAccessPolicy {
    /// Policy with no conditions or grant controls
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, state: PolicyState) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            state,
            created_date_time: None,
            modified_date_time: None,
            conditions: PolicyConditions::default(),
            grant_controls: None,
            session_controls: None,
        }
    }

    pub fn users(&self) -> &UserCondition {
        &self.conditions.users
    }

    /// Built-in grant controls, empty when the policy has no grant block
    pub fn built_in_controls(&self) -> &[String] {
        self.grant_controls
            .as_ref()
            .map(|g| g.built_in_controls.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConditions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: UserCondition,
    #[serde(default)]
    pub applications: Option<Value>,
    #[serde(default)]
    pub platforms: Option<Value>,
    #[serde(default)]
    pub locations: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_app_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCondition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_users: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_users: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_groups: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_groups: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_roles: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_roles: Vec<String>,
}

impl UserCondition {
    pub fn includes_all_users(&self) -> bool {
        self.include_users.iter().any(|u| u == ALL_USERS)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantControls {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub built_in_controls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_authentication_factors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub terms_of_use: Vec<String>,
}

/// Graph collection response wrapper
#[derive(Deserialize)]
struct PolicyCollection {
    value: Vec<ConditionalAccessPolicy>,
}

/// Parse policies from JSON text, rejecting records that don't match the model
///
/// Accepts either a Graph collection response (`{"value": [...]}`) or a bare array.
pub fn parse_policies(contents: &str) -> Result<Vec<ConditionalAccessPolicy>> {
    let value: Value = serde_json::from_str(contents)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(map) if map.contains_key("value") => {
            let collection: PolicyCollection = serde_json::from_value(Value::Object(map))?;
            Ok(collection.value)
        }
        _ => Err(CavizError::InvalidInput(
            "expected a JSON array of policies or an object with a 'value' array".into(),
        )),
    }
}

/// Load policies exported from Graph (e.g. `identity/conditionalAccess/policies`)
pub fn load_policies_file(path: &Path) -> Result<Vec<ConditionalAccessPolicy>> {
    let contents = std::fs::read_to_string(path)?;
    let policies = parse_policies(&contents)?;
    tracing::debug!("Loaded {} policies from {}", policies.len(), path.display());
    Ok(policies)
}

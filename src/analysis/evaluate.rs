//! Policy applicability for a single user
//!
//! Rules run in a fixed order and the first match decides:
//!
//! 1. a disabled policy never applies
//! 2. exclusions (user, then groups) override everything below
//! 3. inclusions: the `All` sentinel, then the user id, then groups
//! 4. anything else does not apply
//!
//! Report-only and unrecognised states are evaluated like `enabled`. The state
//! travels with each [`PolicyEvaluation`] so callers can tell the two apart.

use crate::policy::{ConditionalAccessPolicy, PolicyState};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Which rule decided a policy's applicability
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "id", rename_all = "snake_case")]
pub enum Decision {
    Disabled,
    ExcludedUser,
    ExcludedGroup(String),
    IncludedAllUsers,
    IncludedUser,
    IncludedGroup(String),
    NotIncluded,
}

impl Decision {
    pub fn is_applicable(&self) -> bool {
        matches!(
            self,
            Decision::IncludedAllUsers | Decision::IncludedUser | Decision::IncludedGroup(_)
        )
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Disabled => write!(f, "policy is disabled"),
            Decision::ExcludedUser => write!(f, "user is excluded"),
            Decision::ExcludedGroup(id) => write!(f, "excluded through group {}", id),
            Decision::IncludedAllUsers => write!(f, "policy includes all users"),
            Decision::IncludedUser => write!(f, "user is included"),
            Decision::IncludedGroup(id) => write!(f, "included through group {}", id),
            Decision::NotIncluded => write!(f, "user is not in scope"),
        }
    }
}

/// First entry of `candidates` that appears in `group_ids`, in policy order
fn first_member<'a>(candidates: &'a [String], group_ids: &HashSet<String>) -> Option<&'a String> {
    candidates.iter().find(|g| group_ids.contains(*g))
}

pub fn decide(policy: &ConditionalAccessPolicy, user_id: &str, group_ids: &HashSet<String>) -> Decision {
    if policy.state.is_disabled() {
        return Decision::Disabled;
    }

    let users = policy.users();

    if users.exclude_users.iter().any(|u| u == user_id) {
        return Decision::ExcludedUser;
    }
    if let Some(group) = first_member(&users.exclude_groups, group_ids) {
        return Decision::ExcludedGroup(group.clone());
    }

    if users.includes_all_users() {
        return Decision::IncludedAllUsers;
    }
    if users.include_users.iter().any(|u| u == user_id) {
        return Decision::IncludedUser;
    }
    if let Some(group) = first_member(&users.include_groups, group_ids) {
        return Decision::IncludedGroup(group.clone());
    }

    Decision::NotIncluded
}

/// Whether `policy` applies to the user with the given transitive groups
pub fn applies(policy: &ConditionalAccessPolicy, user_id: &str, group_ids: &HashSet<String>) -> bool {
    decide(policy, user_id, group_ids).is_applicable()
}

/// Ids of the applicable policies, in input order
pub fn applicable_policy_ids(
    policies: &[ConditionalAccessPolicy],
    user_id: &str,
    group_ids: &HashSet<String>,
) -> Vec<String> {
    policies
        .iter()
        .filter(|p| applies(p, user_id, group_ids))
        .map(|p| p.id.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyEvaluation {
    pub policy_id: String,
    pub display_name: String,
    pub state: PolicyState,
    pub applies: bool,
    pub decision: Decision,
}

/// Decision for every policy, in input order
pub fn evaluate_policies(
    policies: &[ConditionalAccessPolicy],
    user_id: &str,
    group_ids: &HashSet<String>,
) -> Vec<PolicyEvaluation> {
    policies
        .iter()
        .map(|p| {
            let decision = decide(p, user_id, group_ids);
            PolicyEvaluation {
                policy_id: p.id.clone(),
                display_name: p.display_name.clone(),
                state: p.state.clone(),
                applies: decision.is_applicable(),
                decision,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn policy(id: &str, state: PolicyState) -> ConditionalAccessPolicy {
        ConditionalAccessPolicy::new(id, id, state)
    }

    #[test]
    fn test_all_users_applies() {
        let mut p = policy("P1", PolicyState::Enabled);
        p.conditions.users.include_users = strings(&["All"]);

        assert!(applies(&p, "u1", &groups(&[])));
        assert_eq!(decide(&p, "u1", &groups(&[])), Decision::IncludedAllUsers);
    }

    #[test]
    fn test_user_exclusion_beats_group_inclusion() {
        let mut p = policy("P2", PolicyState::Enabled);
        p.conditions.users.include_groups = strings(&["G1"]);
        p.conditions.users.exclude_users = strings(&["u1"]);

        assert!(!applies(&p, "u1", &groups(&["G1"])));
        assert_eq!(decide(&p, "u1", &groups(&["G1"])), Decision::ExcludedUser);
        assert!(applies(&p, "u2", &groups(&["G1"])));
    }

    #[test]
    fn test_disabled_never_applies() {
        let mut p = policy("P3", PolicyState::Disabled);
        p.conditions.users.include_users = strings(&["All", "u1"]);

        assert_eq!(decide(&p, "u1", &groups(&[])), Decision::Disabled);
        assert!(!applies(&p, "anyone", &groups(&["G1"])));
    }

    #[test]
    fn test_group_exclusion_beats_all_users() {
        let mut p = policy("P", PolicyState::Enabled);
        p.conditions.users.include_users = strings(&["All"]);
        p.conditions.users.exclude_groups = strings(&["break-glass", "G2"]);

        assert_eq!(
            decide(&p, "u1", &groups(&["G2", "break-glass"])),
            Decision::ExcludedGroup("break-glass".into())
        );
        assert!(applies(&p, "u1", &groups(&["G3"])));
    }

    #[test]
    fn test_same_user_in_include_and_exclude() {
        let mut p = policy("P", PolicyState::Enabled);
        p.conditions.users.include_users = strings(&["u1"]);
        p.conditions.users.exclude_users = strings(&["u1"]);

        assert_eq!(decide(&p, "u1", &groups(&[])), Decision::ExcludedUser);
    }

    #[test]
    fn test_direct_and_group_inclusion() {
        let mut p = policy("P", PolicyState::Enabled);
        p.conditions.users.include_users = strings(&["u1"]);
        p.conditions.users.include_groups = strings(&["G1", "G2"]);

        assert_eq!(decide(&p, "u1", &groups(&["G2"])), Decision::IncludedUser);
        assert_eq!(
            decide(&p, "u2", &groups(&["G2", "G1"])),
            Decision::IncludedGroup("G1".into())
        );
        assert_eq!(decide(&p, "u3", &groups(&["G9"])), Decision::NotIncluded);
    }

    #[test]
    fn test_empty_conditions_do_not_apply() {
        let p = policy("P", PolicyState::Enabled);
        assert_eq!(decide(&p, "u1", &groups(&["G1"])), Decision::NotIncluded);
    }

    #[test]
    fn test_report_only_and_unknown_states_evaluate_as_enabled() {
        for state in [PolicyState::ReportOnly, PolicyState::Other("preview".into())] {
            let mut p = policy("P", state);
            p.conditions.users.include_users = strings(&["All"]);
            assert!(applies(&p, "u1", &groups(&[])));
        }
    }

    #[test]
    fn test_applicable_ids_preserve_order() {
        let mut a = policy("A", PolicyState::Enabled);
        a.conditions.users.include_users = strings(&["All"]);
        let b = policy("B", PolicyState::Enabled);
        let mut c = policy("C", PolicyState::ReportOnly);
        c.conditions.users.include_groups = strings(&["G1"]);
        let mut d = policy("D", PolicyState::Disabled);
        d.conditions.users.include_users = strings(&["All"]);

        let ids = applicable_policy_ids(&[c.clone(), a.clone(), b, d], "u1", &groups(&["G1"]));
        assert_eq!(ids, vec!["C", "A"]);
    }

    #[test]
    fn test_evaluate_policies_reports_state_and_reason() {
        let mut c = policy("C", PolicyState::ReportOnly);
        c.conditions.users.include_groups = strings(&["G1"]);

        let report = evaluate_policies(&[c], "u1", &groups(&["G1"]));
        assert_eq!(report.len(), 1);
        assert!(report[0].applies);
        assert_eq!(report[0].state, PolicyState::ReportOnly);
        assert_eq!(report[0].decision.to_string(), "included through group G1");

        let json = serde_json::to_value(&report[0]).unwrap();
        assert_eq!(json["decision"], serde_json::json!({"reason": "included_group", "id": "G1"}));
        assert_eq!(json["state"], "enabledForReportingButNotEnforced");
    }
}

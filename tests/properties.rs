//! Property tests for applicability and graph normalization

use caviz::analysis::{applicable_policy_ids, applies, normalize_policies};
use caviz::policy::{ConditionalAccessPolicy, GrantControls, PolicyState, UserCondition, ALL_USERS};
use proptest::prelude::*;
use std::collections::HashSet;

fn small_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ALL_USERS.to_string()),
        "[a-d][0-3]",
    ]
}

fn ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(small_id(), 0..4)
}

fn state() -> impl Strategy<Value = PolicyState> {
    prop_oneof![
        Just(PolicyState::Enabled),
        Just(PolicyState::Disabled),
        Just(PolicyState::ReportOnly),
        "[a-z]{3,8}".prop_map(PolicyState::from),
    ]
}

fn controls() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![Just("mfa".to_string()), Just("block".to_string()), Just("compliantDevice".to_string())],
        0..3,
    )
}

prop_compose! {
    fn policy()(
        id in "[a-z0-9]{1,6}",
        state in state(),
        include_users in ids(),
        exclude_users in ids(),
        include_groups in ids(),
        exclude_groups in ids(),
        built_in_controls in controls(),
    ) -> ConditionalAccessPolicy {
        let mut policy = ConditionalAccessPolicy::new(id.clone(), format!("Policy {}", id), state);
        policy.conditions.users = UserCondition {
            include_users,
            exclude_users,
            include_groups,
            exclude_groups,
            ..Default::default()
        };
        policy.grant_controls = Some(GrantControls {
            built_in_controls,
            ..Default::default()
        });
        policy
    }
}

fn subject() -> impl Strategy<Value = (String, HashSet<String>)> {
    ("[a-d][0-3]", prop::collection::hash_set("[a-d][0-3]", 0..4))
}

proptest! {
    #[test]
    fn exclusion_always_wins(mut p in policy(), (user, groups) in subject(), via_group in any::<bool>()) {
        if via_group {
            let g = groups.iter().next().cloned().unwrap_or_else(|| user.clone());
            let mut groups = groups.clone();
            groups.insert(g.clone());
            p.conditions.users.exclude_groups.push(g);
            p.conditions.users.include_users.push(ALL_USERS.to_string());
            prop_assert!(!applies(&p, &user, &groups));
        } else {
            p.conditions.users.exclude_users.push(user.clone());
            p.conditions.users.include_users.push(ALL_USERS.to_string());
            p.conditions.users.include_users.push(user.clone());
            prop_assert!(!applies(&p, &user, &groups));
        }
    }

    #[test]
    fn disabled_never_applies(mut p in policy(), (user, groups) in subject()) {
        p.state = PolicyState::Disabled;
        prop_assert!(!applies(&p, &user, &groups));
    }

    #[test]
    fn all_users_applies_without_exclusion(mut p in policy(), (user, groups) in subject()) {
        prop_assume!(!p.state.is_disabled());
        p.conditions.users.include_users.push(ALL_USERS.to_string());
        p.conditions.users.exclude_users.retain(|u| u != &user);
        p.conditions.users.exclude_groups.retain(|g| !groups.contains(g));
        prop_assert!(applies(&p, &user, &groups));
    }

    #[test]
    fn applicable_ids_keep_input_order(
        policies in prop::collection::vec(policy(), 0..8),
        (user, groups) in subject(),
    ) {
        let result = applicable_policy_ids(&policies, &user, &groups);
        let expected: Vec<String> = policies
            .iter()
            .filter(|p| applies(p, &user, &groups))
            .map(|p| p.id.clone())
            .collect();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn doubling_policies_keeps_nodes_and_doubles_edges(policies in prop::collection::vec(policy(), 0..6)) {
        let once = normalize_policies(&policies);
        let doubled: Vec<ConditionalAccessPolicy> =
            policies.iter().chain(policies.iter()).cloned().collect();
        let twice = normalize_policies(&doubled);

        prop_assert_eq!(&once.nodes, &twice.nodes);
        prop_assert_eq!(twice.edges.len(), once.edges.len() * 2);
        prop_assert_eq!(&twice.edges[..once.edges.len()], &once.edges[..]);
    }

    #[test]
    fn node_ids_are_unique(policies in prop::collection::vec(policy(), 0..8)) {
        let graph = normalize_policies(&policies);
        let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        prop_assert_eq!(ids.len(), graph.nodes.len());
        for edge in &graph.edges {
            prop_assert!(ids.contains(edge.source.as_str()));
            prop_assert!(ids.contains(edge.target.as_str()));
        }
    }
}

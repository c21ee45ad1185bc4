//! Policy graph normalization
//!
//! Turns a policy list into the node/edge document the visualization consumes.
//! Three kinds of node are produced: one per policy, one per include-side
//! user or group entry, and one per built-in grant control. Edges point from
//! conditions into policies (`Include`) and from policies out to controls
//! (`Grant`).
//!
//! Exclusions are not part of the graph. The visual model shows what grants
//! access to a policy, so `excludeUsers` / `excludeGroups` never produce nodes
//! or edges. Use [`crate::analysis::evaluate`] to see their effect.

use crate::policy::{ConditionalAccessPolicy, PolicyState, ALL_USERS};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

pub const ALL_USERS_LABEL: &str = "All Users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Policy,
    Condition,
    Control,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PolicyState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeLabel {
    Include,
    Grant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: EdgeLabel,
}

/// Normalized policy graph
///
/// Serializes in the Cytoscape elements layout, each node and edge wrapped in
/// a `data` object: `{"nodes": [{"data": {...}}], "edges": [{"data": {...}}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphData {
    #[serde(serialize_with = "as_elements")]
    pub nodes: Vec<Node>,
    #[serde(serialize_with = "as_elements")]
    pub edges: Vec<Edge>,
}

fn as_elements<S, T>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    #[derive(Serialize)]
    struct Element<'a, T> {
        data: &'a T,
    }

    serializer.collect_seq(items.iter().map(|data| Element { data }))
}

pub fn policy_node_id(policy_id: &str) -> String {
    format!("policy_{}", policy_id)
}

/// Condition nodes share one namespace for users and groups
pub fn condition_node_id(entry: &str) -> String {
    format!("cond_user_{}", entry)
}

pub fn control_node_id(control: &str) -> String {
    format!("control_{}", control)
}

/// Build the policy graph
///
/// Nodes are deduplicated by id. A node keeps the position of its first
/// emission and the attributes of its last one. Edges are kept in emission
/// order and never deduplicated, so two policies that both include `All`
/// contribute two identical-looking `Include` edges into different targets.
pub fn normalize_policies(policies: &[ConditionalAccessPolicy]) -> GraphData {
    let mut nodes: IndexMap<String, Node> = IndexMap::new();
    let mut edges = Vec::new();

    for policy in policies {
        let policy_id = policy_node_id(&policy.id);
        nodes.insert(
            policy_id.clone(),
            Node {
                id: policy_id.clone(),
                label: policy.display_name.clone(),
                kind: NodeKind::Policy,
                state: Some(policy.state.clone()),
            },
        );

        let users = policy.users();
        for entry in users.include_users.iter().chain(&users.include_groups) {
            let cond_id = condition_node_id(entry);
            let label = if entry == ALL_USERS {
                ALL_USERS_LABEL.to_string()
            } else {
                entry.clone()
            };

            nodes.insert(
                cond_id.clone(),
                Node {
                    id: cond_id.clone(),
                    label,
                    kind: NodeKind::Condition,
                    state: None,
                },
            );
            edges.push(Edge {
                source: cond_id,
                target: policy_id.clone(),
                label: EdgeLabel::Include,
            });
        }

        for control in policy.built_in_controls() {
            let control_id = control_node_id(control);
            nodes.insert(
                control_id.clone(),
                Node {
                    id: control_id.clone(),
                    label: control.clone(),
                    kind: NodeKind::Control,
                    state: None,
                },
            );
            edges.push(Edge {
                source: policy_id.clone(),
                target: control_id,
                label: EdgeLabel::Grant,
            });
        }
    }

    tracing::debug!(
        "Normalized {} policies into {} nodes and {} edges",
        policies.len(),
        nodes.len(),
        edges.len()
    );

    GraphData {
        nodes: nodes.into_values().collect(),
        edges,
    }
}

impl GraphData {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Subgraph around the given policies
    ///
    /// Keeps the policy nodes, every edge touching them, and the condition and
    /// control nodes at the other end of those edges. Ordering of the original
    /// graph is preserved. Ids with no policy node are ignored.
    pub fn focus<S: AsRef<str>>(&self, policy_ids: &[S]) -> GraphData {
        let focused: HashSet<String> = policy_ids
            .iter()
            .map(|id| policy_node_id(id.as_ref()))
            .collect();

        let edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| focused.contains(&e.source) || focused.contains(&e.target))
            .cloned()
            .collect();

        let mut keep: HashSet<&str> = focused.iter().map(String::as_str).collect();
        for edge in &edges {
            keep.insert(&edge.source);
            keep.insert(&edge.target);
        }

        let nodes = self
            .nodes
            .iter()
            .filter(|n| keep.contains(n.id.as_str()))
            .cloned()
            .collect();

        GraphData { nodes, edges }
    }
}

//! Pure policy analysis: graph normalization and applicability evaluation
//!
//! Nothing in here performs I/O; callers fetch policies and group memberships
//! first (see [`crate::graph`]) and hand the materialized data in.

pub mod evaluate;
pub mod normalize;

pub use evaluate::{
    applicable_policy_ids, applies, decide, evaluate_policies, Decision, PolicyEvaluation,
};
pub use normalize::{normalize_policies, Edge, EdgeLabel, GraphData, Node, NodeKind};

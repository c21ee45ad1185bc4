//! Conditional Access policy graph and applicability engine
//!
//! [`analysis`] holds the pure core: turning policies into a node/edge graph
//! and deciding which policies apply to a user. [`graph`] fetches policies and
//! group memberships from Microsoft Graph, and [`config`] loads the settings
//! the client is built from.

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod policy;

pub use error::{CavizError, Result};

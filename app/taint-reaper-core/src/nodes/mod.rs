//! Read-only views over [`Node`](k8s_openapi::api::core::v1::Node) objects and the
//! pure taint-set transformation applied to them.

pub mod conditions;
pub mod taints;

#[cfg(test)]
pub(crate) mod fixtures;

pub use conditions::is_stably_ready;
pub use taints::{has_taint, node_taints, without_taint};

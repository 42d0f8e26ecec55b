use std::future::Future;

use k8s_openapi::api::core::v1::{Node, Taint};
use thiserror::Error;

pub mod operations;

#[cfg(test)]
pub(crate) mod fake;

pub use operations::KubeNodeStore;

/// Writes are conditional on the version the caller last observed.
pub trait NodeStore: Send + Sync {
    fn list(
        &self,
        label_selector: &str,
    ) -> impl Future<Output = Result<Vec<Node>, NodeStoreError>> + Send;

    fn get(&self, name: &str) -> impl Future<Output = Result<Node, NodeStoreError>> + Send;

    /// Replaces the node's taints with exactly `taints`, provided the node is still
    /// at `expected_version`. A version mismatch must surface as
    /// [`NodeStoreError::Conflict`].
    fn update_taints(
        &self,
        name: &str,
        expected_version: &str,
        taints: &[Taint],
    ) -> impl Future<Output = Result<Node, NodeStoreError>> + Send;
}

#[derive(Debug, Error)]
pub enum NodeStoreError {
    #[error("Node '{}' was modified concurrently!", .0)]
    Conflict(String),
    #[error("Node '{}' doesn't exist!", .0)]
    NotFound(String),
    #[error("Node '{}' is missing its resource version!", .0)]
    MissingVersion(String),
    #[error("Kubernetes API request failed! Reason: {}", .0)]
    KubeApiError(kube::Error),
}

impl NodeStoreError {
    pub fn from_kube(name: &str, error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) if response.code == 409 => Self::Conflict(name.to_owned()),
            kube::Error::Api(response) if response.code == 404 => Self::NotFound(name.to_owned()),
            error => Self::KubeApiError(error),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

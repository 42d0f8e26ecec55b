use thiserror::Error;

use crate::{
    kubernetes::NodeStoreError,
    reconciler::config::ReconcilerConfigBuilderError,
    retry::RetryPolicyBuilderError,
};

/// Failure of a whole pass. Only listing can fail a pass.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Couldn't list registered nodes! Reason: {}", .0)]
    ListError(NodeStoreError),
}

/// Failure to remove the marker from a single node.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Node is missing metadata!")]
    MissingObjectMetadata,
    #[error("Node kept changing, gave up after {} attempts!", .attempts)]
    ConflictRetriesExhausted { attempts: u32 },
    #[error("Couldn't patch the node! Reason: {}", .0)]
    StoreError(NodeStoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{}' is not a valid value for {}!", .value, .name)]
    InvalidValue { name: &'static str, value: String },
    #[error("Invalid retry policy! Details: {}", .0)]
    RetryPolicy(RetryPolicyBuilderError),
    #[error("Invalid reconciler configuration! Details: {}", .0)]
    Config(ReconcilerConfigBuilderError),
}

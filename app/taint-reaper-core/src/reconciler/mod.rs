use std::{
    borrow::Cow,
    sync::atomic::{AtomicU32, Ordering},
};

use k8s_openapi::{
    api::core::v1::Node,
    chrono::{DateTime, Utc},
};
use kube::ResourceExt;
use log::{debug, error, info};

use crate::{
    helpers::RequireMetadata,
    kubernetes::{NodeStore, NodeStoreError},
    nodes::{has_taint, is_stably_ready, node_taints, without_taint},
    retry::{retry_on_conflict, RetryError},
};

use self::{
    config::ReconcilerConfig,
    error::{ReconcilerError, UpdateError},
    report::{NodeFailure, ReconcileReport},
};

pub mod config;
pub mod error;
pub mod report;
pub mod runner;

const UNNAMED_NODE: &str = "---";

enum MarkerRemoval {
    Removed,
    NoLongerEligible,
}

/// Strips the unregistered taint from registered nodes that have been ready for
/// longer than the stabilization window.
///
/// Holds no state between passes: every [`reconcile`](Self::reconcile) reads the
/// nodes afresh.
pub struct TaintReconciler<S> {
    store: S,
    config: ReconcilerConfig,
}

impl<S: NodeStore> TaintReconciler<S> {
    pub fn new(store: S, config: ReconcilerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn is_eligible(&self, node: &Node, now: DateTime<Utc>) -> bool {
        has_taint(node, &self.config.marker_taint_key)
            && is_stably_ready(node, now, self.config.stabilization_window)
    }

    pub async fn reconcile(&self) -> Result<ReconcileReport, ReconcilerError> {
        self.reconcile_at(Utc::now()).await
    }

    /// Runs a pass judging readiness as of `now`.
    ///
    /// Fails only when the candidate nodes can't be listed; per-node failures are
    /// logged and collected in the report.
    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> Result<ReconcileReport, ReconcilerError> {
        let nodes = self
            .store
            .list(&self.config.registered_label)
            .await
            .map_err(ReconcilerError::ListError)?;

        let mut report = ReconcileReport::default();

        for node in &nodes {
            if !self.is_eligible(node, now) {
                report.skipped += 1;
                continue;
            }

            let name = match node.require_name_or(UpdateError::MissingObjectMetadata) {
                Ok(name) => name,
                Err(error) => {
                    error!("Found an eligible node without a name! {error}");
                    report.failed.push(NodeFailure {
                        node: UNNAMED_NODE.to_owned(),
                        error,
                    });
                    continue;
                }
            };

            match self.remove_marker(name, node, now).await {
                Ok(MarkerRemoval::Removed) => {
                    info!("Removed unregistered taint from node '{name}'!");
                    report.removed.push(name.to_owned());
                }
                Ok(MarkerRemoval::NoLongerEligible) => {
                    debug!("Node '{name}' changed before its taint was removed, skipping...");
                    report.skipped += 1;
                }
                Err(error) => {
                    error!("Couldn't remove unregistered taint from node '{name}'! {error}");
                    report.failed.push(NodeFailure {
                        node: name.to_owned(),
                        error,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Read-modify-write loop for a single node. The first attempt works on the
    /// listed node, conflicting attempts re-read it.
    async fn remove_marker(
        &self,
        name: &str,
        observed: &Node,
        now: DateTime<Utc>,
    ) -> Result<MarkerRemoval, UpdateError> {
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        retry_on_conflict(&self.config.retry, NodeStoreError::is_conflict, move || async move {
            let node = match attempts.fetch_add(1, Ordering::Relaxed) {
                0 => Cow::Borrowed(observed),
                _ => match self.store.get(name).await {
                    Ok(node) => Cow::Owned(node),
                    Err(NodeStoreError::NotFound(_)) => {
                        return Ok(MarkerRemoval::NoLongerEligible)
                    }
                    Err(error) => return Err(error),
                },
            };

            self.try_remove_marker(name, &node, now).await
        })
        .await
        .map_err(|error| match error {
            RetryError::Exhausted { attempts, .. } => {
                UpdateError::ConflictRetriesExhausted { attempts }
            }
            RetryError::Failed(error) => UpdateError::StoreError(error),
        })
    }

    async fn try_remove_marker(
        &self,
        name: &str,
        node: &Node,
        now: DateTime<Utc>,
    ) -> Result<MarkerRemoval, NodeStoreError> {
        if !self.is_eligible(node, now) {
            return Ok(MarkerRemoval::NoLongerEligible);
        }

        let version = node
            .resource_version()
            .ok_or_else(|| NodeStoreError::MissingVersion(name.to_owned()))?;
        let taints = without_taint(node_taints(node), &self.config.marker_taint_key);

        self.store.update_taints(name, &version, &taints).await?;

        Ok(MarkerRemoval::Removed)
    }
}

use k8s_openapi::api::core::v1::{Node, Taint};
use kube::{
    api::{ListParams, Patch, PatchParams},
    Api, Client,
};
use log::debug;
use serde_json::{json, Value};

use crate::{helpers::pretty_type_name, FIELD_MANAGER};

use super::{NodeStore, NodeStoreError};

/// [`NodeStore`] backed by the cluster-wide [`Node`] API.
#[derive(Clone)]
pub struct KubeNodeStore {
    api: Api<Node>,
}

impl KubeNodeStore {
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

impl NodeStore for KubeNodeStore {
    async fn list(&self, label_selector: &str) -> Result<Vec<Node>, NodeStoreError> {
        debug!(
            "Listing {} resources matching '{label_selector}'...",
            pretty_type_name::<Node>()
        );

        let nodes = self
            .api
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(NodeStoreError::KubeApiError)?;

        Ok(nodes.items)
    }

    async fn get(&self, name: &str) -> Result<Node, NodeStoreError> {
        self.api
            .get(name)
            .await
            .map_err(|error| NodeStoreError::from_kube(name, error))
    }

    async fn update_taints(
        &self,
        name: &str,
        expected_version: &str,
        taints: &[Taint],
    ) -> Result<Node, NodeStoreError> {
        let patch_params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_owned()),
            ..Default::default()
        };

        self.api
            .patch(
                name,
                &patch_params,
                &Patch::Merge(taints_patch(expected_version, taints)),
            )
            .await
            .map_err(|error| NodeStoreError::from_kube(name, error))
    }
}

/// Builds a merge patch touching only `spec.taints`.
///
/// The API server rejects the patch with a conflict when `metadata.resourceVersion`
/// no longer matches, which turns the merge patch into a compare-and-swap.
pub fn taints_patch(expected_version: &str, taints: &[Taint]) -> Value {
    json!({
        "metadata": {
            "resourceVersion": expected_version,
        },
        "spec": {
            "taints": taints,
        },
    })
}

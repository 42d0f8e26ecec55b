use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use k8s_openapi::api::core::v1::{Node, NodeSpec, Taint};
use kube::{core::ErrorResponse, ResourceExt};

use crate::nodes::{node_taints, without_taint};

use super::{NodeStore, NodeStoreError};

/// In-memory [`NodeStore`] with injectable conflicts and failures.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct FakeNodeStore {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    nodes: BTreeMap<String, Node>,
    version: u64,
    list_unavailable: bool,
    pending_conflicts: HashMap<String, u32>,
    failing_updates: HashSet<String>,
    concurrent_taint_removals: HashMap<String, String>,
    concurrent_deletions: HashSet<String>,
    list_calls: u32,
    update_calls: HashMap<String, u32>,
}

impl FakeState {
    fn bump_version(&mut self, name: &str) {
        self.version += 1;
        let version = self.version.to_string();

        if let Some(node) = self.nodes.get_mut(name) {
            node.metadata.resource_version = Some(version);
        }
    }
}

impl FakeNodeStore {
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let store = Self::default();

        for node in nodes {
            store.insert(node);
        }

        store
    }

    pub fn insert(&self, node: Node) {
        let mut state = self.lock();
        let name = node.name_any();

        state.nodes.insert(name.clone(), node);
        state.bump_version(&name);
    }

    pub fn node(&self, name: &str) -> Option<Node> {
        self.lock().nodes.get(name).cloned()
    }

    pub fn taint_keys(&self, name: &str) -> Vec<String> {
        self.node(name)
            .map(|node| {
                node_taints(&node)
                    .iter()
                    .map(|taint| taint.key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn make_list_unavailable(&self) {
        self.lock().list_unavailable = true;
    }

    /// The next `times` updates of `name` fail with a conflict, each one bumping
    /// the stored version as a concurrent writer would.
    pub fn conflict_times(&self, name: &str, times: u32) {
        self.lock().pending_conflicts.insert(name.to_owned(), times);
    }

    pub fn always_conflict(&self, name: &str) {
        self.conflict_times(name, u32::MAX);
    }

    pub fn fail_updates(&self, name: &str) {
        self.lock().failing_updates.insert(name.to_owned());
    }

    /// The concurrent writer behind the next conflict on `name` also removes `key`.
    pub fn remove_taint_on_conflict(&self, name: &str, key: &str) {
        self.lock()
            .concurrent_taint_removals
            .insert(name.to_owned(), key.to_owned());
    }

    /// The concurrent writer behind the next conflict on `name` deletes the node.
    pub fn delete_on_conflict(&self, name: &str) {
        self.lock().concurrent_deletions.insert(name.to_owned());
    }

    pub fn list_calls(&self) -> u32 {
        self.lock().list_calls
    }

    pub fn update_calls(&self, name: &str) -> u32 {
        self.lock().update_calls.get(name).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn unavailable() -> NodeStoreError {
    NodeStoreError::KubeApiError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: "the server is currently unable to handle the request".to_owned(),
        reason: "ServiceUnavailable".to_owned(),
        code: 503,
    }))
}

fn has_label(node: &Node, key: &str) -> bool {
    node.labels().contains_key(key)
}

impl NodeStore for FakeNodeStore {
    /// Only the `key` (label exists) selector form is supported.
    async fn list(&self, label_selector: &str) -> Result<Vec<Node>, NodeStoreError> {
        let mut state = self.lock();
        state.list_calls += 1;

        if state.list_unavailable {
            return Err(unavailable());
        }

        Ok(state
            .nodes
            .values()
            .filter(|node| has_label(node, label_selector))
            .cloned()
            .collect())
    }

    async fn get(&self, name: &str) -> Result<Node, NodeStoreError> {
        self.node(name)
            .ok_or_else(|| NodeStoreError::NotFound(name.to_owned()))
    }

    async fn update_taints(
        &self,
        name: &str,
        expected_version: &str,
        taints: &[Taint],
    ) -> Result<Node, NodeStoreError> {
        let mut state = self.lock();
        *state.update_calls.entry(name.to_owned()).or_default() += 1;

        if state.failing_updates.contains(name) {
            return Err(unavailable());
        }

        if let Some(pending) = state.pending_conflicts.get_mut(name) {
            if *pending > 0 {
                if *pending != u32::MAX {
                    *pending -= 1;
                }

                if let Some(key) = state.concurrent_taint_removals.remove(name) {
                    if let Some(node) = state.nodes.get_mut(name) {
                        let remaining = without_taint(node_taints(node), &key);
                        node.spec.get_or_insert_with(NodeSpec::default).taints = Some(remaining);
                    }
                }

                state.bump_version(name);

                if state.concurrent_deletions.remove(name) {
                    state.nodes.remove(name);
                }

                return Err(NodeStoreError::Conflict(name.to_owned()));
            }
        }

        let node = state
            .nodes
            .get_mut(name)
            .ok_or_else(|| NodeStoreError::NotFound(name.to_owned()))?;

        if node.metadata.resource_version.as_deref() != Some(expected_version) {
            return Err(NodeStoreError::Conflict(name.to_owned()));
        }

        node.spec.get_or_insert_with(NodeSpec::default).taints = Some(taints.to_vec());
        state.bump_version(name);

        Ok(state.nodes[name].clone())
    }
}

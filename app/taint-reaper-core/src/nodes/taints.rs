use k8s_openapi::api::core::v1::{Node, Taint};

pub fn node_taints(node: &Node) -> &[Taint] {
    node.spec
        .as_ref()
        .and_then(|spec| spec.taints.as_deref())
        .unwrap_or_default()
}

pub fn has_taint(node: &Node, key: &str) -> bool {
    node_taints(node).iter().any(|taint| taint.key == key)
}

/// Returns a copy of `taints` with every entry keyed `key` dropped.
/// Remaining taints keep their relative order.
pub fn without_taint(taints: &[Taint], key: &str) -> Vec<Taint> {
    taints
        .iter()
        .filter(|taint| taint.key != key)
        .cloned()
        .collect()
}

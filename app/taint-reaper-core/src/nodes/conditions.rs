use std::time::Duration;

use k8s_openapi::{
    api::core::v1::{Node, NodeCondition},
    chrono::{DateTime, Utc},
};

pub const NODE_READY_CONDITION: &str = "Ready";
const CONDITION_TRUE: &str = "True";

pub fn ready_condition(node: &Node) -> Option<&NodeCondition> {
    node.status
        .as_ref()?
        .conditions
        .as_ref()?
        .iter()
        .find(|condition| condition.type_ == NODE_READY_CONDITION)
}

/// A node is stably ready when its `Ready` condition is `True` and has held for
/// strictly longer than `window` as of `now`.
///
/// A condition without a transition time, or one transitioning in the future,
/// never counts as stable.
pub fn is_stably_ready(node: &Node, now: DateTime<Utc>, window: Duration) -> bool {
    let Some(condition) = ready_condition(node) else {
        return false;
    };

    if condition.status != CONDITION_TRUE {
        return false;
    }

    condition
        .last_transition_time
        .as_ref()
        .and_then(|transitioned| (now - transitioned.0).to_std().ok())
        .is_some_and(|held_for| held_for > window)
}

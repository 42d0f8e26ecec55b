use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{Node, NodeCondition, NodeSpec, NodeStatus, Taint},
    apimachinery::pkg::apis::meta::v1::Time,
    chrono::{DateTime, Utc},
};
use kube::core::ObjectMeta;

use crate::REGISTERED_LABEL_KEY;

pub struct NodeFixture {
    name: String,
    labels: BTreeMap<String, String>,
    taints: Vec<Taint>,
    conditions: Vec<NodeCondition>,
}

impl NodeFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            labels: BTreeMap::new(),
            taints: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn registered(mut self) -> Self {
        self.labels
            .insert(REGISTERED_LABEL_KEY.to_owned(), "true".to_owned());
        self
    }

    pub fn taint(mut self, key: &str) -> Self {
        self.taints.push(Taint {
            key: key.to_owned(),
            effect: "NoExecute".to_owned(),
            ..Default::default()
        });
        self
    }

    pub fn ready_since(self, since: DateTime<Utc>) -> Self {
        self.condition("Ready", "True", Some(since))
    }

    pub fn condition(mut self, type_: &str, status: &str, since: Option<DateTime<Utc>>) -> Self {
        self.conditions.push(NodeCondition {
            type_: type_.to_owned(),
            status: status.to_owned(),
            last_transition_time: since.map(Time),
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(self.name),
                labels: Some(self.labels),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                taints: Some(self.taints),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                conditions: Some(self.conditions),
                ..Default::default()
            }),
        }
    }
}

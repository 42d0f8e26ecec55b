use std::fmt::Display;

use super::error::UpdateError;

#[derive(Debug)]
pub struct NodeFailure {
    pub node: String,
    pub error: UpdateError,
}

/// Outcome of a single reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub removed: Vec<String>,
    pub failed: Vec<NodeFailure>,
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn inspected(&self) -> usize {
        self.removed.len() + self.failed.len() + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inspected {} node(s): {} untainted, {} failed, {} skipped",
            self.inspected(),
            self.removed.len(),
            self.failed.len(),
            self.skipped
        )
    }
}

pub mod helpers;
pub mod kubernetes;
pub mod nodes;
pub mod reconciler;
pub mod retry;

/// Label carried by every node that completed at least one successful registration.
pub const REGISTERED_LABEL_KEY: &str = "karpenter.sh/registered";
/// Taint placed on freshly joined nodes until they prove stable readiness.
pub const UNREGISTERED_TAINT_KEY: &str = "karpenter.sh/unregistered";

pub const FIELD_MANAGER: &str = "taint-reaper";

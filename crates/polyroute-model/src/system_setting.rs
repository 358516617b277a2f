use serde::{Deserialize, Serialize};

/// Admin-editable key/value store (§6). Recognized keys: `force_project_binding`
/// ∈ {"true","false"}, `force_project_timeout` ∈ seconds-integer; arbitrary
/// other keys are accepted for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
}

pub const KEY_FORCE_PROJECT_BINDING: &str = "force_project_binding";
pub const KEY_FORCE_PROJECT_TIMEOUT: &str = "force_project_timeout";

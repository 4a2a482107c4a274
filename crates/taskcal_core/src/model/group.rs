use serde::{Deserialize, Serialize};

/// Names older stores used to mark their default group before the flag existed.
pub const LEGACY_DEFAULT_GROUP_NAMES: [&str; 2] = ["Default", "Nhóm mặc định"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: String,
}

impl Group {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

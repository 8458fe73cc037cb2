use serde::{Deserialize, Serialize};

/// Type of change carried by a single row-change payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// New row inserted
    #[serde(alias = "insert")]
    Insert,

    /// Existing row updated
    #[serde(alias = "update")]
    Update,

    /// Row deleted
    #[serde(alias = "delete")]
    Delete,
}

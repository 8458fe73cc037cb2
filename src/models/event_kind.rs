use std::fmt;

use serde::{Deserialize, Serialize};

use super::change_kind::ChangeKind;

/// Event kind a descriptor entry listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    /// Every change kind
    #[serde(rename = "*")]
    Any,
}

impl EventKind {
    pub fn matches(&self, kind: ChangeKind) -> bool {
        match self {
            EventKind::Any => true,
            EventKind::Insert => kind == ChangeKind::Insert,
            EventKind::Update => kind == ChangeKind::Update,
            EventKind::Delete => kind == ChangeKind::Delete,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Insert => write!(f, "INSERT"),
            EventKind::Update => write!(f, "UPDATE"),
            EventKind::Delete => write!(f, "DELETE"),
            EventKind::Any => write!(f, "*"),
        }
    }
}

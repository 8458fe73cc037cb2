use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Entity, EventKind, RowFilter};

/// One `(entity, event kind, optional filter)` entry of a subscription
/// descriptor. Passed verbatim to the transport when registering handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    pub entity: Entity,
    pub event_kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RowFilter>,
}

impl SubscriptionSpec {
    pub fn new(entity: Entity, event_kind: EventKind) -> Self {
        Self {
            entity,
            event_kind,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl fmt::Display for SubscriptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}/{} [{}]", self.entity, self.event_kind, filter),
            None => write!(f, "{}/{}", self.entity, self.event_kind),
        }
    }
}

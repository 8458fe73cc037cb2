use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{RealtimeError, Result};

use super::{ChangeKind, Entity};

/// Row-change notification delivered by the transport.
///
/// Wire shape:
///
/// ```json
/// {"table": "booking", "eventType": "UPDATE",
///  "new": {"id": "b1", "student_id": "u1"}, "old": {"id": "b1"}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub entity: Entity,
    pub kind: ChangeKind,
    /// Current row values (INSERT and UPDATE)
    pub new_row: Option<Map<String, JsonValue>>,
    /// Previous row values (UPDATE and DELETE)
    pub old_row: Option<Map<String, JsonValue>>,
}

#[derive(Deserialize)]
struct RawChange {
    #[serde(alias = "entity")]
    table: String,
    #[serde(rename = "eventType", alias = "event_type", alias = "type")]
    event_type: ChangeKind,
    #[serde(default, rename = "new", alias = "record")]
    new_row: Option<JsonValue>,
    #[serde(default, rename = "old", alias = "old_record")]
    old_row: Option<JsonValue>,
}

impl ChangeEvent {
    /// Parse a raw payload. Payloads that name an unknown table, carry no
    /// event type, or lack the row their kind requires are rejected.
    pub fn parse(payload: &JsonValue) -> Result<Self> {
        let raw = RawChange::deserialize(payload)
            .map_err(|e| RealtimeError::MalformedEvent(e.to_string()))?;

        let entity: Entity = raw.table.parse()?;
        let new_row = row_object(raw.new_row, "new")?;
        let old_row = row_object(raw.old_row, "old")?;

        match raw.event_type {
            ChangeKind::Insert | ChangeKind::Update if new_row.is_none() => {
                return Err(RealtimeError::MalformedEvent(format!(
                    "{:?} on {} without a new row",
                    raw.event_type, entity
                )));
            },
            ChangeKind::Delete if old_row.is_none() => {
                return Err(RealtimeError::MalformedEvent(format!(
                    "DELETE on {} without an old row",
                    entity
                )));
            },
            _ => {},
        }

        Ok(Self {
            entity,
            kind: raw.event_type,
            new_row,
            old_row,
        })
    }

    /// Rows carried by this event, current values first.
    pub fn rows(&self) -> impl Iterator<Item = &Map<String, JsonValue>> {
        self.new_row.iter().chain(self.old_row.iter())
    }
}

// Transports send `{}` or null for the absent side of a change.
fn row_object(value: Option<JsonValue>, side: &str) -> Result<Option<Map<String, JsonValue>>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(map)) if map.is_empty() => Ok(None),
        Some(JsonValue::Object(map)) => Ok(Some(map)),
        Some(other) => Err(RealtimeError::MalformedEvent(format!(
            "'{}' row must be an object, got {}",
            side, other
        ))),
    }
}

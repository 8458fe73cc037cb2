//! Routing of inbound change payloads to debounced cache keys.

use serde_json::Value as JsonValue;
use tokio::time::Instant;

use crate::cache_key::CacheKey;
use crate::debouncer::Debouncer;
use crate::error::Result;
use crate::models::row_filter::column_equals;
use crate::models::{ChangeEvent, Entity, SubscriptionSpec};
use crate::scope::Scope;

/// Why a well-formed event was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// The payload's table or kind does not belong to the handler's entry.
    SpecMismatch,
    /// A row contradicts the entry's filter.
    FilteredOut,
    /// The event concerns another actor, or cannot be attributed to this one.
    OutOfScope,
}

/// Result of routing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Forwarded(CacheKey),
    Skipped(Skip),
}

/// Matches events against a scope and hands the scope-qualified key to the
/// debouncer. Never touches the cache.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    scope: Scope,
}

impl EventDispatcher {
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Parse and match `payload` for the handler registered with `spec`.
    pub fn route(&self, spec: &SubscriptionSpec, payload: &JsonValue) -> Result<Dispatch> {
        let event = ChangeEvent::parse(payload)?;
        Ok(self.route_event(spec, &event))
    }

    pub fn route_event(&self, spec: &SubscriptionSpec, event: &ChangeEvent) -> Dispatch {
        if event.entity != spec.entity || !spec.event_kind.matches(event.kind) {
            return Dispatch::Skipped(Skip::SpecMismatch);
        }

        if let Some(filter) = &spec.filter {
            // A reassignment matches on one side only; either side touches the
            // scope's cached rows. Rows lacking the column passed the
            // server-side filter already (DELETE often carries only the key).
            let mut carried = event.rows().filter_map(|row| filter.matches_row(row)).peekable();
            if carried.peek().is_some() && !carried.any(|matched| matched) {
                return Dispatch::Skipped(Skip::FilteredOut);
            }
        } else if !self.attributed_to_scope(event) {
            return Dispatch::Skipped(Skip::OutOfScope);
        }

        Dispatch::Forwarded(CacheKey::for_entity(event.entity, &self.scope))
    }

    /// Route and, when matched, restart the debounce window of the key.
    pub fn dispatch(
        &self,
        spec: &SubscriptionSpec,
        payload: &JsonValue,
        debouncer: &mut Debouncer,
        now: Instant,
    ) -> Result<Dispatch> {
        let dispatch = self.route(spec, payload)?;
        if let Dispatch::Forwarded(key) = &dispatch {
            debouncer.schedule(key.clone(), now);
        }
        Ok(dispatch)
    }

    // Unfiltered entries reach every actor, so per-actor scopes only accept
    // rows that name the actor. Admin sees everything.
    fn attributed_to_scope(&self, event: &ChangeEvent) -> bool {
        let (Some(column), Some(id)) = (self.scope.actor_column(), self.scope.scope_id()) else {
            return true;
        };
        if event.entity == Entity::Users {
            return false;
        }
        event
            .rows()
            .any(|row| row.get(column).is_some_and(|cell| column_equals(cell, id)))
    }
}

//! Scope-qualified cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Entity;
use crate::scope::Scope;

/// Identifier of one slice of cached data.
///
/// Per-actor scopes produce `[entity, scope_id]`; the admin scope produces a
/// single `admin-<entity>` segment. Keys from different actors never compare
/// equal, so an invalidation cannot cross actor boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn for_entity(entity: Entity, scope: &Scope) -> Self {
        match scope.scope_id() {
            Some(id) => Self::new([entity.cache_segment(), id]),
            None => Self::new([format!("admin-{}", entity.cache_segment())]),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_scoped_keys() {
        let key = CacheKey::for_entity(Entity::Booking, &Scope::user("u1"));
        assert_eq!(key.segments(), ["bookings", "u1"]);

        let key = CacheKey::for_entity(Entity::RescheduleProposal, &Scope::instructor("i9"));
        assert_eq!(key.segments(), ["reschedule-proposals", "i9"]);
    }

    #[test]
    fn test_admin_keys() {
        assert_eq!(
            CacheKey::for_entity(Entity::Booking, &Scope::Admin).segments(),
            ["admin-bookings"]
        );
        assert_eq!(
            CacheKey::for_entity(Entity::Users, &Scope::Admin).segments(),
            ["admin-users"]
        );
    }

    #[test]
    fn test_keys_do_not_cross_actors() {
        let a = CacheKey::for_entity(Entity::Booking, &Scope::user("u1"));
        let b = CacheKey::for_entity(Entity::Booking, &Scope::user("u2"));
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "[bookings, u1]");
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::json!(["bookings", "u1"]));
    }
}

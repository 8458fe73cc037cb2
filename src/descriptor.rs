//! Declarative subscription tables per scope kind.
//!
//! Each scope kind subscribes to a fixed list of `(entity, event kind,
//! filter)` entries; there is no dynamic registration.
//!
//! | scope        | entries                                                                  |
//! |--------------|--------------------------------------------------------------------------|
//! | `User`       | `booking/*` (`student_id=eq.{id}`), conflict and proposal INSERT/UPDATE   |
//! | `Instructor` | `booking/*` (`instructor_id=eq.{id}`), conflict and proposal INSERT/UPDATE |
//! | `Admin`      | `booking/*`, `users/*`                                                   |
//!
//! Conflicts and proposals are linked to bookings rather than to actors, so
//! the backend offers no server-side filter for them; the dispatcher matches
//! those payloads against the scope instead.

use crate::models::{Entity, EventKind, RowFilter, SubscriptionSpec};
use crate::scope::Scope;

/// Ordered list of subscription entries built for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDescriptor {
    scope: Scope,
    specs: Vec<SubscriptionSpec>,
}

impl SubscriptionDescriptor {
    pub fn for_scope(scope: &Scope) -> Self {
        let specs = match scope {
            Scope::User(id) => actor_specs(RowFilter::eq("student_id", id.as_str())),
            Scope::Instructor(id) => actor_specs(RowFilter::eq("instructor_id", id.as_str())),
            Scope::Admin => vec![
                SubscriptionSpec::new(Entity::Booking, EventKind::Any),
                SubscriptionSpec::new(Entity::Users, EventKind::Any),
            ],
        };

        Self {
            scope: scope.clone(),
            specs,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn channel_name(&self) -> String {
        self.scope.channel_name()
    }

    pub fn specs(&self) -> &[SubscriptionSpec] {
        &self.specs
    }

    pub fn get(&self, index: usize) -> Option<&SubscriptionSpec> {
        self.specs.get(index)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn actor_specs(booking_filter: RowFilter) -> Vec<SubscriptionSpec> {
    vec![
        SubscriptionSpec::new(Entity::Booking, EventKind::Any).with_filter(booking_filter),
        SubscriptionSpec::new(Entity::WeatherConflict, EventKind::Insert),
        SubscriptionSpec::new(Entity::WeatherConflict, EventKind::Update),
        SubscriptionSpec::new(Entity::RescheduleProposal, EventKind::Insert),
        SubscriptionSpec::new(Entity::RescheduleProposal, EventKind::Update),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(descriptor: &SubscriptionDescriptor, entity: Entity) -> usize {
        descriptor.specs().iter().filter(|s| s.entity == entity).count()
    }

    #[test]
    fn test_user_descriptor() {
        let d = SubscriptionDescriptor::for_scope(&Scope::user("u1"));
        assert_eq!(d.channel_name(), "user-u1-updates");
        assert_eq!(d.len(), 5);
        assert_eq!(count(&d, Entity::Booking), 1);
        assert_eq!(count(&d, Entity::WeatherConflict), 2);
        assert_eq!(count(&d, Entity::RescheduleProposal), 2);

        let booking = &d.specs()[0];
        assert_eq!(booking.event_kind, EventKind::Any);
        assert_eq!(booking.filter, Some(RowFilter::eq("student_id", "u1")));
        assert!(d.specs()[1..].iter().all(|s| s.filter.is_none()));
    }

    #[test]
    fn test_instructor_descriptor_filters_by_instructor() {
        let d = SubscriptionDescriptor::for_scope(&Scope::instructor("i3"));
        assert_eq!(d.channel_name(), "instructor-i3-updates");
        assert_eq!(d.len(), 5);
        assert_eq!(
            d.specs()[0].filter.as_ref().map(|f| f.to_string()),
            Some("instructor_id=eq.i3".to_string())
        );
    }

    #[test]
    fn test_admin_descriptor_is_unfiltered() {
        let d = SubscriptionDescriptor::for_scope(&Scope::Admin);
        assert_eq!(d.channel_name(), "admin-system-updates");
        assert_eq!(
            d.specs(),
            &[
                SubscriptionSpec::new(Entity::Booking, EventKind::Any),
                SubscriptionSpec::new(Entity::Users, EventKind::Any),
            ]
        );
    }

    #[test]
    fn test_conflict_entries_cover_insert_and_update_only() {
        let d = SubscriptionDescriptor::for_scope(&Scope::user("u1"));
        let kinds: Vec<EventKind> = d
            .specs()
            .iter()
            .filter(|s| s.entity == Entity::WeatherConflict)
            .map(|s| s.event_kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::Insert, EventKind::Update]);
    }
}

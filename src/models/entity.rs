use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RealtimeError;

/// Backend table whose row changes are streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Lesson bookings
    Booking,

    /// Weather conflicts detected against a booking
    WeatherConflict,

    /// Reschedule proposals generated for a conflicting booking
    RescheduleProposal,

    /// Actor accounts (admin scope only)
    Users,
}

impl Entity {
    /// Table name as it appears in change payloads.
    pub fn table_name(&self) -> &'static str {
        match self {
            Entity::Booking => "booking",
            Entity::WeatherConflict => "weather_conflict",
            Entity::RescheduleProposal => "reschedule_proposal",
            Entity::Users => "users",
        }
    }

    /// First segment of the cache key invalidated for this entity.
    pub fn cache_segment(&self) -> &'static str {
        match self {
            Entity::Booking => "bookings",
            Entity::WeatherConflict => "weather-conflicts",
            Entity::RescheduleProposal => "reschedule-proposals",
            Entity::Users => "users",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Entity {
    type Err = RealtimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking" | "bookings" => Ok(Entity::Booking),
            "weather_conflict" | "weather_conflicts" => Ok(Entity::WeatherConflict),
            "reschedule_proposal" | "reschedule_proposals" => Ok(Entity::RescheduleProposal),
            "users" | "user" => Ok(Entity::Users),
            other => Err(RealtimeError::MalformedEvent(format!(
                "unrecognized entity '{}'",
                other
            ))),
        }
    }
}

//! Data models for booking-realtime.
//!
//! Defines the subscription descriptor entries, the parsed change payloads
//! and the status values exposed to callers.

pub mod change_event;
pub mod change_kind;
pub mod channel_status;
pub mod connection_status;
pub mod entity;
pub mod event_kind;
pub mod registry_info;
pub mod row_filter;
pub mod subscription_spec;


pub use change_event::ChangeEvent;
pub use change_kind::ChangeKind;
pub use channel_status::ChannelStatus;
pub use connection_status::ConnectionStatus;
pub use entity::Entity;
pub use event_kind::EventKind;
pub use registry_info::RegistryInfo;
pub use row_filter::RowFilter;
pub use subscription_spec::SubscriptionSpec;

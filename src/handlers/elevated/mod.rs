// handlers/elevated/mod.rs - Elevated handlers (admin role required)
//
// Every route here runs behind `require_admin`.
pub mod analytics;
pub mod events;
pub mod users;

pub use analytics::analytics_get;
pub use events::event_create;
pub use users::{user_approve, user_create, user_delete};

// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here runs behind `require_authenticated`, except registration
// which runs behind `require_identity` since the user record does not exist yet.
pub mod auth;
pub mod badges;
pub mod checkin;
pub mod messages;
pub mod users;

pub use auth::{register, whoami};
pub use badges::user_badges;
pub use checkin::event_checkin;
pub use messages::user_messages;
pub use users::{user_get, user_update, users_list};

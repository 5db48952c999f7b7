// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: / and /api/* read-only endpoints
pub mod csrf;
pub mod events;
pub mod root;

pub use csrf::csrf_issue;
pub use events::{event_get, events_list};
pub use root::{health, root};

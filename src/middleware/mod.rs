pub mod auth;
pub mod csrf;
pub mod rate_limit;
pub mod response;
pub mod security_headers;

pub use auth::{require_admin, require_authenticated, require_identity, AuthIdentity, AuthUser};
pub use csrf::csrf_guard;
pub use rate_limit::rate_limit;
pub use response::{ApiResponse, ApiResult};
pub use security_headers::security_headers;

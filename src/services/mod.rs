pub mod analytics;
pub mod badges;
pub mod csrf;
pub mod events;
pub mod messages;
pub mod pagination;
pub mod rate_limit;
pub mod users;

pub use analytics::{Analytics, AnalyticsService};
pub use badges::BadgeService;
pub use csrf::CsrfProtection;
pub use events::EventService;
pub use messages::MessageService;
pub use pagination::{ListQuery, Page, PageRequest, Pagination, PaginationEngine, PaginationStrategy, TextSearch, WindowConfig};
pub use rate_limit::RateLimiter;

pub mod admin_auth;
pub mod rate_limit;

pub use admin_auth::AdminAuth;
pub use rate_limit::RateLimitLayer;

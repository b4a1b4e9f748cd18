//! Bearer token authentication for mutating routes.

mod middleware;

pub use middleware::AuthUser;

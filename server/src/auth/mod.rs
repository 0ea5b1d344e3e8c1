//! Admin route authentication.

mod middleware;

pub use middleware::AdminUser;

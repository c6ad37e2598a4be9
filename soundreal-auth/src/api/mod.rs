//! HTTP API handlers for soundreal-auth

pub mod account;
pub mod health;
pub mod post_login;

pub use account::{account_routes, admin_check, usage};
pub use health::health_routes;
pub use post_login::{auth_routes, post_login};

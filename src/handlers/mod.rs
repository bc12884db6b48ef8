// handlers/mod.rs - HTTP handlers, one file per route group

pub mod fallback; // * - unmatched routes
pub mod health; // GET /health
pub mod users; // GET /api/v1/users

pub use fallback::route_not_found;
pub use health::health;
pub use users::get_user_by_email;

//! Application flows built on the ports.

mod auth;
mod blog;

pub use auth::{AuthService, AuthSession, Credentials, Registration};
pub use blog::BlogService;

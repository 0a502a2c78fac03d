//! Credential and blog stores.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use sea_orm::DatabaseConnection;
pub use memory::{InMemoryBlogRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresBlogRepository, PostgresUserRepository};

#[cfg(all(feature = "postgres", test))]
mod tests;

/// Mask an email for logging: keeps the first character and the domain.
pub(crate) fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

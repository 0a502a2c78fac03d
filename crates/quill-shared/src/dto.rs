//! Data Transfer Objects - request/response types for the API.
//!
//! Request bodies use `Option` fields so that missing members are reported as
//! validation errors instead of JSON decode failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Request to login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of blog create and update requests.
///
/// Only `title` and `content` are read; other members are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: Option<String>,
}

/// An explicit `null` reads as `""`, so it fails the same rules as a blank
/// value. Only an absent member means "leave unchanged".
fn null_as_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| Some(value.unwrap_or_default()))
}

/// `?page=N` query of the listing routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

/// A user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Register/login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub user: UserResponse,
    pub message: String,
}

/// Refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// A blog post with its author's name. `author` is null for orphaned posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogListResponse {
    pub blogs: Vec<BlogResponse>,
    pub meta: PageMeta,
}

/// Create/update response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogMessageResponse {
    pub message: String,
    pub blog: BlogResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

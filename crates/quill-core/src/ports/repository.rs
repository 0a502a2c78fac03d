use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{BlogPost, Page, PageRequest, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique violations surface as [`RepoError::Constraint`].
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity in a single statement keyed by its ID.
    /// Fails with [`RepoError::NotFound`] when the row is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Credential store.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Display names for a set of user ids. Unknown ids are left out.
    async fn names_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError>;
}

/// Blog post store.
#[async_trait]
pub trait BlogRepository: BaseRepository<BlogPost, Uuid> {
    /// Newest-first page of posts, optionally restricted to one owner.
    async fn find_page(
        &self,
        owner_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepoError>;
}

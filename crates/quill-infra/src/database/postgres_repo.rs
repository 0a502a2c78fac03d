//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use quill_core::domain::{BlogPost, Page, PageRequest, User};
use quill_core::error::RepoError;
use quill_core::ports::{BlogRepository, UserRepository};

use super::entity::blog::{self, Entity as BlogEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::mask_email;
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL blog repository.
pub type PostgresBlogRepository = PostgresBaseRepository<BlogEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn names_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = UserEntity::find()
            .select_only()
            .column(user::Column::Id)
            .column(user::Column::Name)
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl BlogRepository for PostgresBlogRepository {
    async fn find_page(
        &self,
        owner_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepoError> {
        let mut query = BlogEntity::find()
            .order_by_desc(blog::Column::CreatedAt)
            .order_by_desc(blog::Column::Id);

        if let Some(owner_id) = owner_id {
            query = query.filter(blog::Column::OwnerId.eq(owner_id));
        }

        let paginator = query.paginate(&self.db, page.per_page);
        let total = paginator.num_items().await.map_err(map_db_err)?;

        // Past the last page; the paginator's offset math would overflow.
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let models = paginator
            .fetch_page(page.page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }
}

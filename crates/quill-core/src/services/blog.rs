//! Blog post CRUD with ownership checks.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{BlogChanges, BlogPage, BlogPost, BlogView, NewBlogPost, Page, PageRequest};
use crate::error::{DomainError, RepoError};
use crate::policy;
use crate::ports::{BaseRepository, BlogRepository, UserRepository};
use crate::validation::{self, ValidationErrors};

const TITLE_MAX: usize = 255;

/// Blog resource flow. Author names are joined in from the user store on read.
pub struct BlogService {
    blogs: Arc<dyn BlogRepository>,
    users: Arc<dyn UserRepository>,
}

impl BlogService {
    pub fn new(blogs: Arc<dyn BlogRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { blogs, users }
    }

    /// All posts, newest first.
    pub async fn list(&self, page: PageRequest) -> Result<BlogPage, DomainError> {
        let posts = self.blogs.find_page(None, page).await?;
        self.resolve_page(posts).await
    }

    /// Posts owned by `actor_id`, newest first.
    pub async fn list_mine(
        &self,
        actor_id: Uuid,
        page: PageRequest,
    ) -> Result<BlogPage, DomainError> {
        let posts = self.blogs.find_page(Some(actor_id), page).await?;
        self.resolve_page(posts).await
    }

    pub async fn create(&self, actor_id: Uuid, input: NewBlogPost) -> Result<BlogView, DomainError> {
        let mut errors = ValidationErrors::new();

        let title =
            validation::required(&mut errors, "title", input.title.as_deref()).map(str::trim);
        if let Some(title) = title {
            validation::max_chars(&mut errors, "title", title, TITLE_MAX);
        }
        let content = validation::required(&mut errors, "content", input.content.as_deref());

        errors.into_result()?;

        let (Some(title), Some(content)) = (title, content) else {
            return Err(DomainError::Internal("validated input missing".to_string()));
        };

        let post = BlogPost::new(actor_id, title.to_string(), content.to_string());
        let post = self.blogs.create(post).await?;

        tracing::info!(blog_id = %post.id, owner_id = %actor_id, "Blog post created");
        self.view(post).await
    }

    /// Partial update by the post's owner.
    ///
    /// Existence is checked before ownership, ownership before input.
    pub async fn update(
        &self,
        actor_id: Uuid,
        id: Uuid,
        changes: BlogChanges,
    ) -> Result<BlogView, DomainError> {
        let mut post = self.find(id).await?;
        policy::ensure_can_mutate(actor_id, &post, "update")?;

        let mut errors = ValidationErrors::new();
        let title =
            validation::filled(&mut errors, "title", changes.title.as_deref()).map(str::trim);
        if let Some(title) = title {
            validation::max_chars(&mut errors, "title", title, TITLE_MAX);
        }
        validation::filled(&mut errors, "content", changes.content.as_deref());

        errors.into_result()?;

        post.apply(BlogChanges {
            title: title.map(str::to_string),
            content: changes.content,
        });

        let post = self.blogs.update(post).await.map_err(|e| not_found_or(e, id))?;

        tracing::info!(blog_id = %id, "Blog post updated");
        self.view(post).await
    }

    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let post = self.find(id).await?;
        policy::ensure_can_mutate(actor_id, &post, "delete")?;

        self.blogs.delete(id).await.map_err(|e| not_found_or(e, id))?;

        tracing::info!(blog_id = %id, "Blog post deleted");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<BlogPost, DomainError> {
        self.blogs
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Blog",
                id,
            })
    }

    async fn view(&self, post: BlogPost) -> Result<BlogView, DomainError> {
        let mut names = self.users.names_by_ids(&[post.owner_id]).await?;
        let author = names.remove(&post.owner_id);
        Ok(BlogView { post, author })
    }

    async fn resolve_page(&self, posts: Page<BlogPost>) -> Result<BlogPage, DomainError> {
        if posts.items.is_empty() {
            return Ok(BlogPage::Empty);
        }

        let mut owner_ids: Vec<Uuid> = posts.items.iter().map(|p| p.owner_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let names: HashMap<Uuid, String> = self.users.names_by_ids(&owner_ids).await?;

        Ok(BlogPage::Posts(posts.map(|post| BlogView {
            author: names.get(&post.owner_id).cloned(),
            post,
        })))
    }
}

/// A row vanishing between lookup and write reads as "not found".
fn not_found_or(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::NotFound {
            entity_type: "Blog",
            id,
        },
        other => other.into(),
    }
}

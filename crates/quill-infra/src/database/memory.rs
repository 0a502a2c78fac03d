//! In-memory stores, used when `DATABASE_URL` is not configured and in tests.
//!
//! They mirror the PostgreSQL constraints the flows rely on: unique emails and
//! updates that fail when the row is gone.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{BlogPost, Page, PageRequest, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, BlogRepository, UserRepository};

use super::mask_email;

/// In-memory credential store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Uuid) -> bool {
    users.values().any(|u| u.id != except && u.email == email)
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        if email_taken(&users, &user.email, user.id) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if email_taken(&users, &user.email, user.id) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn names_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError> {
        let users = self.users.read().await;

        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|u| (*id, u.name.clone())))
            .collect())
    }
}

/// In-memory blog store.
#[derive(Default)]
pub struct InMemoryBlogRepository {
    posts: RwLock<HashMap<Uuid, BlogPost>>,
}

impl InMemoryBlogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<BlogPost, Uuid> for InMemoryBlogRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn create(&self, post: BlogPost) -> Result<BlogPost, RepoError> {
        let mut posts = self.posts.write().await;

        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("blogs_pkey".to_string()));
        }

        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: BlogPost) -> Result<BlogPost, RepoError> {
        let mut posts = self.posts.write().await;

        match posts.get_mut(&post.id) {
            Some(slot) => {
                *slot = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl BlogRepository for InMemoryBlogRepository {
    async fn find_page(
        &self,
        owner_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepoError> {
        let posts = self.posts.read().await;

        let mut matching: Vec<&BlogPost> = posts
            .values()
            .filter(|p| owner_id.is_none_or(|owner| p.owner_id == owner))
            .collect();

        // Newest first; id breaks ties so paging is stable.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn user(name: &str, email: &str) -> User {
        User::new(name.to_string(), email.to_string(), "hash".to_string())
    }

    fn post_at(owner_id: Uuid, title: &str, minutes_ago: i64) -> BlogPost {
        let mut post = BlogPost::new(owner_id, title.to_string(), "content".to_string());
        post.created_at = Utc::now() - TimeDelta::minutes(minutes_ago);
        post
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_constraint_violation() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("Alice", "a@x.com")).await.unwrap();

        let result = repo.create(user("Mallory", "a@x.com")).await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert!(repo.find_by_email("a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_names_by_ids_skips_unknown() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.create(user("Alice", "a@x.com")).await.unwrap();
        let ghost = Uuid::new_v4();

        let names = repo.names_by_ids(&[alice.id, ghost]).await.unwrap();

        assert_eq!(names.len(), 1);
        assert_eq!(names[&alice.id], "Alice");
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found() {
        let repo = InMemoryBlogRepository::new();
        let result = repo.update(post_at(Uuid::new_v4(), "Hi", 0)).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_find_page_newest_first_and_filtered() {
        let repo = InMemoryBlogRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.create(post_at(alice, "old", 30)).await.unwrap();
        repo.create(post_at(bob, "middle", 20)).await.unwrap();
        repo.create(post_at(alice, "new", 10)).await.unwrap();

        let all = repo.find_page(None, PageRequest::new(1)).await.unwrap();
        let titles: Vec<_> = all.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "middle", "old"]);
        assert_eq!(all.total_items, 3);

        let mine = repo
            .find_page(Some(alice), PageRequest::new(1))
            .await
            .unwrap();
        assert_eq!(mine.items.len(), 2);
        assert!(mine.items.iter().all(|p| p.owner_id == alice));
    }

    #[tokio::test]
    async fn test_find_page_splits_pages() {
        let repo = InMemoryBlogRepository::new();
        let owner = Uuid::new_v4();
        for i in 0..12 {
            repo.create(post_at(owner, &format!("post {i}"), i)).await.unwrap();
        }

        let first = repo.find_page(None, PageRequest::new(1)).await.unwrap();
        let second = repo.find_page(None, PageRequest::new(2)).await.unwrap();
        let third = repo.find_page(None, PageRequest::new(3)).await.unwrap();

        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].title, "post 0");
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.total_pages, 2);
        assert!(third.items.is_empty());
    }
}

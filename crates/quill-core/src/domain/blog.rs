use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Page;

/// Blog post entity. `owner_id` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Create a new post owned by `owner_id`.
    pub fn new(owner_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Omitted fields keep their current values.
    pub fn apply(&mut self, changes: BlogChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a post. Only these fields are accepted from callers.
#[derive(Debug, Clone, Default)]
pub struct NewBlogPost {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Partial update of a post. `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A post together with its author's display name, resolved at read time.
#[derive(Debug, Clone)]
pub struct BlogView {
    pub post: BlogPost,
    pub author: Option<String>,
}

/// Result of a listing. `Empty` lets callers render a zero state.
#[derive(Debug, Clone)]
pub enum BlogPage {
    Empty,
    Posts(Page<BlogView>),
}

impl BlogPage {
    pub fn is_empty(&self) -> bool {
        matches!(self, BlogPage::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_omitted_fields() {
        let mut post = BlogPost::new(Uuid::new_v4(), "Hi".to_string(), "World".to_string());
        let created_at = post.created_at;

        post.apply(BlogChanges {
            title: Some("Hello".to_string()),
            content: None,
        });

        assert_eq!(post.title, "Hello");
        assert_eq!(post.content, "World");
        assert_eq!(post.created_at, created_at);
        assert!(post.updated_at >= created_at);
    }
}

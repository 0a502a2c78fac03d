//! Ownership policy for blog posts.

use uuid::Uuid;

use crate::domain::BlogPost;
use crate::error::DomainError;

/// Only a resource's creator may mutate or delete it.
pub fn can_mutate(actor_id: Uuid, owner_id: Uuid) -> bool {
    actor_id == owner_id
}

/// [`can_mutate`] for a post, as a `Forbidden` error naming the attempted action.
pub fn ensure_can_mutate(
    actor_id: Uuid,
    post: &BlogPost,
    action: &'static str,
) -> Result<(), DomainError> {
    if can_mutate(actor_id, post.owner_id) {
        Ok(())
    } else {
        Err(DomainError::Forbidden {
            entity_type: "blog post",
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_can_mutate() {
        let owner = Uuid::new_v4();
        assert!(can_mutate(owner, owner));
        assert!(!can_mutate(Uuid::new_v4(), owner));
    }

    #[test]
    fn test_forbidden_message_names_action() {
        let post = BlogPost::new(Uuid::new_v4(), "Hi".to_string(), "World".to_string());

        assert!(ensure_can_mutate(post.owner_id, &post, "update").is_ok());

        let err = ensure_can_mutate(Uuid::new_v4(), &post, "delete").unwrap_err();
        assert_eq!(
            err.to_string(),
            "You are not authorized to delete this blog post."
        );
    }
}

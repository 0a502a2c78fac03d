//! Domain entities - the core business objects.

mod blog;
mod page;
mod user;

pub use blog::{BlogChanges, BlogPage, BlogPost, BlogView, NewBlogPost};
pub use page::{Page, PageRequest};
pub use user::User;

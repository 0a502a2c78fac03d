//! Blog post handlers. Every route requires an authenticated caller.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{BlogChanges, BlogPage, NewBlogPost, PageRequest};
use quill_shared::dto::{BlogMessageResponse, BlogRequest, MessageResponse, PageQuery};

use super::{blog_list, blog_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn page_response(page: BlogPage, empty_message: &str) -> HttpResponse {
    match page {
        BlogPage::Empty => HttpResponse::Ok().json(MessageResponse::new(empty_message)),
        BlogPage::Posts(page) => HttpResponse::Ok().json(blog_list(page)),
    }
}

fn page_request(query: &PageQuery) -> PageRequest {
    PageRequest::new(query.page.unwrap_or(1))
}

/// GET /api/blogs
pub async fn index(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blogs.list(page_request(&query)).await?;
    Ok(page_response(page, "No blogs found."))
}

/// GET /api/my-blogs
pub async fn mine(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .blogs
        .list_mine(identity.user.id, page_request(&query))
        .await?;
    Ok(page_response(page, "You have no blogs."))
}

/// POST /api/blogs
pub async fn store(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<BlogRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let view = state
        .blogs
        .create(
            identity.user.id,
            NewBlogPost {
                title: req.title,
                content: req.content,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(BlogMessageResponse {
        message: "Blog post created successfully".to_string(),
        blog: blog_response(view),
    }))
}

/// PUT /api/blogs/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<BlogRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let view = state
        .blogs
        .update(
            identity.user.id,
            path.into_inner(),
            BlogChanges {
                title: req.title,
                content: req.content,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(BlogMessageResponse {
        message: "Blog post updated successfully".to_string(),
        blog: blog_response(view),
    }))
}

/// DELETE /api/blogs/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.blogs.delete(identity.user.id, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Blog post deleted successfully")))
}

//! HTTP handlers and route configuration.

mod auth;
mod blogs;
mod health;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use actix_web::web;

use quill_core::domain::{BlogView, Page, User};
use quill_core::ports::RateLimiter;
use quill_shared::dto::{BlogListResponse, BlogResponse, PageMeta, UserResponse};

use crate::middleware::error::{self, AppError, AppResult};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Register state, extractor configuration and every route.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let limiter: Arc<dyn RateLimiter> = state.rate_limiter.clone();

        cfg.app_data(web::Data::new(state))
            .app_data(error::json_config())
            .app_data(error::query_config())
            .app_data(error::path_config());

        configure_routes(cfg, limiter);

        cfg.default_service(web::to(route_not_allowed));
    }
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::resource("/register")
                    .wrap(RateLimitMiddleware::new(limiter.clone()))
                    .route(web::post().to(auth::register)),
            )
            .service(
                web::resource("/login")
                    .wrap(RateLimitMiddleware::new(limiter))
                    .route(web::post().to(auth::login)),
            )
            // Authenticated routes
            .route("/user", web::get().to(auth::user))
            .route("/logout", web::post().to(auth::logout))
            .route("/refresh", web::post().to(auth::refresh))
            .route("/blogs", web::get().to(blogs::index))
            .route("/blogs", web::post().to(blogs::store))
            .route("/my-blogs", web::get().to(blogs::mine))
            .route("/blogs/{id}", web::put().to(blogs::update))
            .route("/blogs/{id}", web::delete().to(blogs::destroy)),
    );
}

async fn route_not_allowed() -> AppResult<&'static str> {
    Err(AppError::RouteNotAllowed)
}

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

fn blog_response(view: BlogView) -> BlogResponse {
    let BlogView { post, author } = view;
    BlogResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        owner_id: post.owner_id,
        author,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn blog_list(page: Page<BlogView>) -> BlogListResponse {
    let meta = PageMeta {
        current_page: page.page,
        per_page: page.per_page,
        total: page.total_items,
        last_page: page.total_pages,
    };

    BlogListResponse {
        blogs: page.items.into_iter().map(blog_response).collect(),
        meta,
    }
}

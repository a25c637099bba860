//! Web layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints for the Pressnote server:
//! - News pages (home feed, article detail with comments)
//! - Comment pages (create under an article, owner-only edit/delete)
//! - Note pages (owner-scoped list/add/detail/edit/delete)
//! - Auth pages (login, logout, signup)
//!
//! Every protected route redirects anonymous requests to
//! `/auth/login/?next=<original url>`; owner-only resources answer 404 to
//! authenticated non-owners.

pub mod auth;
pub mod middleware;
pub mod news;
pub mod notes;
pub mod render;

#[cfg(test)]
mod tests;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, Identity, PageError};
pub use render::Renderer;

/// Build the complete router with middleware.
pub fn build_router(state: AppState) -> Router {
    // Routes that require a logged-in user; anonymous requests are
    // redirected to the login page with a `next` parameter.
    let protected = Router::new()
        .route(
            "/edit_comment/{id}/",
            get(news::edit_comment_page).post(news::edit_comment),
        )
        .route(
            "/delete_comment/{id}/",
            get(news::delete_comment_page)
                .post(news::delete_comment)
                .delete(news::delete_comment),
        )
        .route("/notes/", get(notes::list_notes))
        .route("/notes/add/", get(notes::add_page).post(notes::add_note))
        .route("/notes/done/", get(notes::done_page))
        .route("/notes/{slug}/", get(notes::note_detail))
        .route(
            "/notes/{slug}/edit/",
            get(notes::edit_page).post(notes::edit_note),
        )
        .route(
            "/notes/{slug}/delete/",
            get(notes::delete_page).post(notes::delete_note),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_login));

    // Public routes; comment creation checks authentication itself because
    // it shares the article detail path.
    Router::new()
        .route("/", get(news::home))
        .route(
            "/news/{id}/",
            get(news::news_detail).post(news::post_comment),
        )
        .route("/auth/login/", get(auth::login_page).post(auth::login))
        .route("/auth/logout/", get(auth::logout))
        .route("/auth/signup/", get(auth::signup_page).post(auth::signup))
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

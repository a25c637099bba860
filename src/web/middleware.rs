//! Web middleware and shared request types
//!
//! Contains:
//! - `AppState` wiring the services together
//! - `Identity` (anonymous or a resolved user) populated from the session
//!   cookie on every request
//! - `require_login`, which redirects anonymous requests to the login page
//! - `PageError`, the response type for failed page requests

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxNoteRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::models::User;
use crate::services::{
    CommentService, CommentServiceError, NewsService, NoteService, NoteServiceError, UserService,
};
use crate::web::render::Renderer;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub news_service: Arc<NewsService>,
    pub comment_service: Arc<CommentService>,
    pub note_service: Arc<NoteService>,
    pub renderer: Arc<Renderer>,
}

impl AppState {
    /// Wire repositories and services over a connected pool.
    pub fn build(pool: SqlitePool, config: &Config) -> Result<Self> {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let note_repo = SqlxNoteRepository::boxed(pool);

        Ok(Self {
            user_service: Arc::new(UserService::new(
                user_repo,
                session_repo,
                config.auth.session_expiration_days,
            )),
            news_service: Arc::new(NewsService::new(
                news_repo.clone(),
                config.news.home_page_size,
            )),
            comment_service: Arc::new(CommentService::new(comment_repo, news_repo)),
            note_service: Arc::new(NoteService::new(note_repo)),
            renderer: Arc::new(Renderer::new().context("Failed to initialize templates")?),
        })
    }
}

/// The requesting identity, resolved from the session cookie.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    /// The current user on a route behind `require_login`.
    ///
    /// Anonymous here means the middleware was bypassed, which is a wiring
    /// bug, not a user error.
    pub fn authorized(&self) -> Result<&User, PageError> {
        self.user().ok_or_else(|| {
            PageError::Internal(anyhow::anyhow!("protected route reached without identity"))
        })
    }
}

/// Error response for page requests
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The resource does not exist, or the requester may not know whether
    /// it exists
    #[error("Not found")]
    NotFound,

    /// Unexpected failure; logged and rendered as a 500 page
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => (
                StatusCode::NOT_FOUND,
                Html("<!doctype html><title>Not Found</title><h1>404 Not Found</h1>"),
            )
                .into_response(),
            PageError::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<!doctype html><title>Server Error</title><h1>500 Server Error</h1>"),
                )
                    .into_response()
            }
        }
    }
}

// Validation errors carry form context and must be handled by the submitting
// handler; reaching these conversions with one is a bug.
impl From<CommentServiceError> for PageError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound => PageError::NotFound,
            CommentServiceError::Validation(msg) => {
                PageError::Internal(anyhow::anyhow!("unhandled validation error: {msg}"))
            }
            CommentServiceError::Internal(err) => PageError::Internal(err),
        }
    }
}

impl From<NoteServiceError> for PageError {
    fn from(err: NoteServiceError) -> Self {
        match err {
            NoteServiceError::NotFound => PageError::NotFound,
            NoteServiceError::Validation { message, .. } => {
                PageError::Internal(anyhow::anyhow!("unhandled validation error: {message}"))
            }
            NoteServiceError::Internal(err) => PageError::Internal(err),
        }
    }
}

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Extract the session token from the request cookies.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(token) = cookie
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
        {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Redirect an anonymous request to the login page, preserving the
/// originally requested URL.
pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!("/auth/login/?next={next}"))
}

/// Identity-loading middleware, applied to every route.
///
/// Resolves the session cookie to a user and stores the result as an
/// `Identity` extension; requests without a valid session are anonymous.
pub async fn load_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match session_token_from_headers(request.headers()) {
        Some(token) => match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => Identity::User(user),
            Ok(None) => Identity::Anonymous,
            Err(err) => {
                tracing::error!("Session validation failed: {:#}", err);
                Identity::Anonymous
            }
        },
        None => Identity::Anonymous,
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Login-required middleware for protected routes.
pub async fn require_login(request: Request, next: Next) -> Response {
    let authenticated = request
        .extensions()
        .get::<Identity>()
        .map(Identity::is_authenticated)
        .unwrap_or(false);

    if !authenticated {
        let next_url = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        return login_redirect(&next_url).into_response();
    }

    next.run(request).await
}

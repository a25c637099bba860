//! Authentication pages
//!
//! - `GET|POST /auth/login/` — login form; success redirects to the `next`
//!   URL (or the home page), bad credentials re-render the form
//! - `GET /auth/logout/` — destroys the session, renders a logged-out page
//! - `GET|POST /auth/signup/` — registration; success redirects to login
//!
//! The session token travels in an HttpOnly `session` cookie.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;

use crate::services::UserServiceError;
use crate::web::middleware::{AppState, Identity, PageError, SESSION_COOKIE};
use crate::web::render::base_context;

/// Query parameters for the login page
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Form payload for login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after login, carried through the form as a hidden field
    pub next: Option<String>,
}

/// Form payload for signup
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /auth/login/
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    render_login(&state, &identity, "", query.next.as_deref(), None)
}

/// POST /auth/login/
pub async fn login(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    match state.user_service.login(&form.username, &form.password).await {
        Ok(session) => {
            let target = redirect_target(form.next.as_deref());
            let mut response = Redirect::to(&target).into_response();
            response
                .headers_mut()
                .insert(header::SET_COOKIE, session_cookie(&session.id)?);
            Ok(response)
        }
        Err(UserServiceError::InvalidCredentials) => render_login(
            &state,
            &identity,
            &form.username,
            form.next.as_deref(),
            Some("Invalid username or password"),
        ),
        Err(UserServiceError::InternalError(err)) => Err(PageError::Internal(err)),
        Err(err) => Err(PageError::Internal(anyhow::anyhow!(err))),
    }
}

/// GET /auth/logout/
///
/// Always renders the logged-out page with a 200, whether or not a session
/// existed.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    if let Some(token) = crate::web::middleware::session_token_from_headers(&headers) {
        state
            .user_service
            .logout(&token)
            .await
            .map_err(|e| PageError::Internal(anyhow::anyhow!(e)))?;
    }

    let context = base_context(&Identity::Anonymous);
    let html = state.renderer.page("logged_out.html", &context)?;
    let mut response = html.into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, clear_session_cookie()?);
    Ok(response)
}

/// GET /auth/signup/
pub async fn signup_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    render_signup(&state, &identity, "", None)
}

/// POST /auth/signup/
pub async fn signup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    match state
        .user_service
        .register(&form.username, &form.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/auth/login/").into_response()),
        Err(UserServiceError::UserExists(username)) => render_signup(
            &state,
            &identity,
            &form.username,
            Some(&format!("Username \"{username}\" is already taken")),
        ),
        Err(UserServiceError::ValidationError(message)) => {
            render_signup(&state, &identity, &form.username, Some(&message))
        }
        Err(UserServiceError::InternalError(err)) => Err(PageError::Internal(err)),
        Err(err) => Err(PageError::Internal(anyhow::anyhow!(err))),
    }
}

/// Resolve the post-login redirect, refusing anything but local paths.
fn redirect_target(next: Option<&str>) -> String {
    let decoded = next.map(|n| {
        urlencoding::decode(n)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| n.to_string())
    });
    match decoded {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/".to_string(),
    }
}

fn session_cookie(token: &str) -> Result<HeaderValue, PageError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .map_err(|e| PageError::Internal(anyhow::anyhow!("Invalid cookie value: {e}")))
}

fn clear_session_cookie() -> Result<HeaderValue, PageError> {
    HeaderValue::from_str(&format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0"))
        .map_err(|e| PageError::Internal(anyhow::anyhow!("Invalid cookie value: {e}")))
}

fn render_login(
    state: &AppState,
    identity: &Identity,
    username: &str,
    next: Option<&str>,
    error: Option<&str>,
) -> Result<Response, PageError> {
    let mut context = base_context(identity);
    context.insert("username", username);
    context.insert("next", &next);
    context.insert("error", &error);
    Ok(state.renderer.page("login.html", &context)?.into_response())
}

fn render_signup(
    state: &AppState,
    identity: &Identity,
    username: &str,
    error: Option<&str>,
) -> Result<Response, PageError> {
    let mut context = base_context(identity);
    context.insert("username", username);
    context.insert("error", &error);
    Ok(state.renderer.page("signup.html", &context)?.into_response())
}

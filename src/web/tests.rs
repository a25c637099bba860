//! Router-level tests
//!
//! Exercise the full router over an in-memory database: page availability
//! per identity, login redirects with the `next` parameter, 404s for
//! non-owners, validation re-renders, and listing order.

use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::repositories::{CommentRepository, SqlxCommentRepository, SqlxNoteRepository};
use crate::db::{create_test_pool, migrations};
use crate::models::{Comment, CreateNewsInput, News, NoteInput, User};
use crate::services::{BLOCKED_WORDS, BLOCKED_WORD_WARNING};
use crate::web::{build_router, AppState};

const PASSWORD: &str = "password123";

/// The identity classes exercised against each endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Client {
    Anonymous,
    Owner,
    NonOwner,
}

struct TestApp {
    pool: SqlitePool,
    state: AppState,
    router: Router,
}

impl TestApp {
    async fn spawn() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let state = AppState::build(pool.clone(), &Config::default())
            .expect("Failed to build app state");
        let router = build_router(state.clone());
        Self {
            pool,
            state,
            router,
        }
    }

    /// A fresh client with no session.
    fn anonymous(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to start test server")
    }

    async fn register(&self, username: &str) -> User {
        self.state
            .user_service
            .register(username, PASSWORD)
            .await
            .expect("Failed to register user")
    }

    /// A client logged in as an existing user.
    async fn logged_in(&self, username: &str) -> TestServer {
        let mut server = self.anonymous();
        server.save_cookies();
        let response = server
            .post("/auth/login/")
            .form(&[("username", username), ("password", PASSWORD)])
            .await;
        assert!(
            response.status_code().is_redirection(),
            "Login as {username} should redirect, got {}",
            response.status_code()
        );
        server
    }

    /// A client for the given identity class, with `author` as the owner.
    async fn client_for(&self, client: Client) -> TestServer {
        match client {
            Client::Anonymous => self.anonymous(),
            Client::Owner => self.logged_in("author").await,
            Client::NonOwner => self.logged_in("reader").await,
        }
    }

    async fn create_news(&self, title: &str, date: Option<NaiveDate>) -> News {
        self.state
            .news_service
            .create(CreateNewsInput {
                title: title.to_string(),
                text: "Article text".to_string(),
                date,
            })
            .await
            .expect("Failed to create article")
    }

    async fn create_comment(&self, news_id: i64, author_id: i64, text: &str) -> Comment {
        self.state
            .comment_service
            .create(news_id, author_id, text)
            .await
            .expect("Failed to create comment")
    }

    async fn create_note(&self, author_id: i64, title: &str, slug: &str) {
        self.state
            .note_service
            .create(
                author_id,
                &NoteInput {
                    title: title.to_string(),
                    text: "Note text".to_string(),
                    slug: slug.to_string(),
                },
            )
            .await
            .expect("Failed to create note");
    }

    async fn comment_count(&self) -> i64 {
        SqlxCommentRepository::new(self.pool.clone())
            .count()
            .await
            .expect("Failed to count comments")
    }

    async fn note_count(&self) -> i64 {
        use crate::db::repositories::NoteRepository;
        SqlxNoteRepository::new(self.pool.clone())
            .count()
            .await
            .expect("Failed to count notes")
    }
}

fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("Location header should be valid UTF-8")
        .to_string()
}

// ============================================================================
// Route availability
// ============================================================================

#[tokio::test]
async fn test_public_pages_available_for_all_identities() {
    let app = TestApp::spawn().await;
    app.register("author").await;
    let news = app.create_news("Headline", None).await;

    let urls = [
        "/".to_string(),
        format!("/news/{}/", news.id),
        "/auth/login/".to_string(),
        "/auth/signup/".to_string(),
    ];

    for client in [Client::Anonymous, Client::Owner] {
        for url in &urls {
            let server = app.client_for(client).await;
            let response = server.get(url).await;
            assert_eq!(
                response.status_code(),
                StatusCode::OK,
                "GET {url} as {client:?} should be 200"
            );
        }
    }
}

#[tokio::test]
async fn test_logout_page_available_for_all_identities() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    for client in [Client::Anonymous, Client::Owner] {
        let server = app.client_for(client).await;
        let response = server.get("/auth/logout/").await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_anonymous_redirected_from_protected_pages() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "A comment").await;
    app.create_note(author.id, "A note", "a-note").await;

    let urls = [
        format!("/edit_comment/{}/", comment.id),
        format!("/delete_comment/{}/", comment.id),
        "/notes/".to_string(),
        "/notes/add/".to_string(),
        "/notes/done/".to_string(),
        "/notes/a-note/".to_string(),
        "/notes/a-note/edit/".to_string(),
        "/notes/a-note/delete/".to_string(),
    ];

    let server = app.anonymous();
    for url in &urls {
        let response = server.get(url).await;
        assert!(
            response.status_code().is_redirection(),
            "GET {url} should redirect anonymous users"
        );
        assert_eq!(location(&response), format!("/auth/login/?next={url}"));
    }
}

#[tokio::test]
async fn test_comment_pages_for_owner_and_non_owner() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.register("reader").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "A comment").await;

    let urls = [
        format!("/edit_comment/{}/", comment.id),
        format!("/delete_comment/{}/", comment.id),
    ];

    for (client, expected) in [
        (Client::Owner, StatusCode::OK),
        (Client::NonOwner, StatusCode::NOT_FOUND),
    ] {
        let server = app.client_for(client).await;
        for url in &urls {
            let response = server.get(url).await;
            assert_eq!(
                response.status_code(),
                expected,
                "GET {url} as {client:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_note_pages_for_owner_and_non_owner() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.register("reader").await;
    app.create_note(author.id, "A note", "a-note").await;

    let owner_only = [
        "/notes/a-note/",
        "/notes/a-note/edit/",
        "/notes/a-note/delete/",
    ];
    let any_user = ["/notes/", "/notes/add/", "/notes/done/"];

    for (client, expected) in [
        (Client::Owner, StatusCode::OK),
        (Client::NonOwner, StatusCode::NOT_FOUND),
    ] {
        let server = app.client_for(client).await;
        for url in &owner_only {
            let response = server.get(*url).await;
            assert_eq!(
                response.status_code(),
                expected,
                "GET {url} as {client:?}"
            );
        }
    }

    for client in [Client::Owner, Client::NonOwner] {
        let server = app.client_for(client).await;
        for url in &any_user {
            let response = server.get(*url).await;
            assert_eq!(response.status_code(), StatusCode::OK, "GET {url}");
        }
    }
}

#[tokio::test]
async fn test_missing_article_is_404() {
    let app = TestApp::spawn().await;
    let server = app.anonymous();
    let response = server.get("/news/999/").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Comment logic
// ============================================================================

#[tokio::test]
async fn test_anonymous_cannot_create_comment() {
    let app = TestApp::spawn().await;
    let news = app.create_news("Headline", None).await;

    let server = app.anonymous();
    let url = format!("/news/{}/", news.id);
    let response = server.post(&url).form(&[("text", "Hello")]).await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), format!("/auth/login/?next={url}"));
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn test_user_can_create_comment() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let news = app.create_news("Headline", None).await;

    let server = app.logged_in("author").await;
    let response = server
        .post(&format!("/news/{}/", news.id))
        .form(&[("text", "First comment")])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), format!("/news/{}/#comments", news.id));
    assert_eq!(app.comment_count().await, 1);

    let comments = app
        .state
        .comment_service
        .list_for_news(news.id)
        .await
        .expect("Failed to list comments");
    assert_eq!(comments[0].text, "First comment");
    assert_eq!(comments[0].author_id, author.id);
}

#[tokio::test]
async fn test_blocked_words_are_rejected_with_warning() {
    let app = TestApp::spawn().await;
    app.register("author").await;
    let news = app.create_news("Headline", None).await;

    let server = app.logged_in("author").await;
    for word in BLOCKED_WORDS {
        let response = server
            .post(&format!("/news/{}/", news.id))
            .form(&[("text", format!("Some text, {word}, more text").as_str())])
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(
            response.text().contains(BLOCKED_WORD_WARNING),
            "Form should redisplay with the warning for {word}"
        );
    }
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn test_non_numeric_ids_are_404() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let server = app.anonymous();
    let response = server.get("/news/abc/").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let server = app.logged_in("author").await;
    for url in ["/edit_comment/abc/", "/delete_comment/abc/"] {
        let response = server.get(url).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "GET {url}");
    }
}

#[tokio::test]
async fn test_author_can_edit_comment() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "Original text").await;

    let server = app.logged_in("author").await;
    let response = server
        .post(&format!("/edit_comment/{}/", comment.id))
        .form(&[("text", "Updated text")])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), format!("/news/{}/#comments", news.id));

    let comments = app
        .state
        .comment_service
        .list_for_news(news.id)
        .await
        .expect("Failed to list comments");
    assert_eq!(comments[0].text, "Updated text");
}

#[tokio::test]
async fn test_blocked_word_in_edit_is_rejected() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "Polite text").await;

    let server = app.logged_in("author").await;
    let response = server
        .post(&format!("/edit_comment/{}/", comment.id))
        .form(&[("text", format!("You utter {}!", BLOCKED_WORDS[0]).as_str())])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains(BLOCKED_WORD_WARNING));

    let comments = app
        .state
        .comment_service
        .list_for_news(news.id)
        .await
        .expect("Failed to list comments");
    assert_eq!(comments[0].text, "Polite text");
}

#[tokio::test]
async fn test_non_owner_cannot_edit_comment() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.register("reader").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "Original text").await;

    let server = app.logged_in("reader").await;
    let response = server
        .post(&format!("/edit_comment/{}/", comment.id))
        .form(&[("text", "Hijacked")])
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let comments = app
        .state
        .comment_service
        .list_for_news(news.id)
        .await
        .expect("Failed to list comments");
    assert_eq!(comments[0].text, "Original text");
}

#[tokio::test]
async fn test_author_can_delete_comment_via_delete_method() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "Delete me").await;

    let server = app.logged_in("author").await;
    let response = server
        .delete(&format!("/delete_comment/{}/", comment.id))
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), format!("/news/{}/#comments", news.id));
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn test_non_owner_cannot_delete_comment() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.register("reader").await;
    let news = app.create_news("Headline", None).await;
    let comment = app.create_comment(news.id, author.id, "Keep me").await;

    let server = app.logged_in("reader").await;
    let response = server
        .post(&format!("/delete_comment/{}/", comment.id))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.comment_count().await, 1);
}

// ============================================================================
// News content
// ============================================================================

#[tokio::test]
async fn test_home_page_caps_and_orders_articles() {
    let app = TestApp::spawn().await;
    for day in 1..=11 {
        app.create_news(
            &format!("Article {day:02}"),
            NaiveDate::from_ymd_opt(2024, 6, day),
        )
        .await;
    }

    let server = app.anonymous();
    let body = server.get("/").await.text();

    // Capped at the configured page size of 10: the oldest article drops off
    assert_eq!(body.matches("href=\"/news/").count(), 10);
    assert!(!body.contains("Article 01"));

    // Newest first
    let newest = body.find("Article 11").expect("Newest article missing");
    let older = body.find("Article 10").expect("Second article missing");
    assert!(newest < older);
}

#[tokio::test]
async fn test_comments_are_displayed_oldest_first() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let news = app.create_news("Headline", None).await;

    // Insert out of chronological order with explicit timestamps
    let repo = SqlxCommentRepository::new(app.pool.clone());
    let base = Utc::now();
    for (offset, text) in [(2, "zeta-comment"), (0, "alpha-comment"), (1, "beta-comment")] {
        repo.create(news.id, author.id, text, base + Duration::minutes(offset))
            .await
            .expect("Failed to create comment");
    }

    let server = app.anonymous();
    let body = server.get(&format!("/news/{}/", news.id)).await.text();

    let first = body.find("alpha-comment").expect("Missing comment");
    let second = body.find("beta-comment").expect("Missing comment");
    let third = body.find("zeta-comment").expect("Missing comment");
    assert!(first < second && second < third);
}

#[tokio::test]
async fn test_comment_form_only_for_authenticated_users() {
    let app = TestApp::spawn().await;
    app.register("author").await;
    let news = app.create_news("Headline", None).await;
    let url = format!("/news/{}/", news.id);

    let server = app.anonymous();
    let anonymous_body = server.get(&url).await.text();
    assert!(!anonymous_body.contains("name=\"text\""));

    let server = app.logged_in("author").await;
    let body = server.get(&url).await.text();
    assert!(body.contains("name=\"text\""));
}

#[tokio::test]
async fn test_notes_link_on_home_only_for_authenticated_users() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let server = app.anonymous();
    let anonymous_body = server.get("/").await.text();
    assert!(!anonymous_body.contains("/notes/"));

    let server = app.logged_in("author").await;
    let body = server.get("/").await.text();
    assert!(body.contains("/notes/"));
}

// ============================================================================
// Note logic
// ============================================================================

#[tokio::test]
async fn test_user_can_create_note() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let server = app.logged_in("author").await;
    let response = server
        .post("/notes/add/")
        .form(&[
            ("title", "Test note"),
            ("text", "Note text"),
            ("slug", "test-note"),
        ])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/notes/done/");
    assert_eq!(app.note_count().await, 1);
}

#[tokio::test]
async fn test_anonymous_cannot_create_note() {
    let app = TestApp::spawn().await;

    let server = app.anonymous();
    let response = server
        .post("/notes/add/")
        .form(&[("title", "Test note"), ("text", "Note text"), ("slug", "")])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/auth/login/?next=/notes/add/");
    assert_eq!(app.note_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_slug_redisplays_form() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.create_note(author.id, "First", "taken").await;

    let server = app.logged_in("author").await;
    let response = server
        .post("/notes/add/")
        .form(&[("title", "Second"), ("text", "Text"), ("slug", "taken")])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("already exists"));
    assert_eq!(app.note_count().await, 1);
}

#[tokio::test]
async fn test_blank_slug_is_generated_from_title() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;

    let server = app.logged_in("author").await;
    let response = server
        .post("/notes/add/")
        .form(&[
            ("title", "New note without slug"),
            ("text", "Note text"),
            ("slug", ""),
        ])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/notes/done/");

    let note = app
        .state
        .note_service
        .get_owned("new-note-without-slug", author.id)
        .await
        .expect("Note should exist under the generated slug");
    assert_eq!(note.title, "New note without slug");
}

#[tokio::test]
async fn test_owner_can_edit_note() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.create_note(author.id, "Old title", "old-slug").await;

    let server = app.logged_in("author").await;
    let response = server
        .post("/notes/old-slug/edit/")
        .form(&[
            ("title", "New title"),
            ("text", "New text"),
            ("slug", "new-slug"),
        ])
        .await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/notes/done/");

    let note = app
        .state
        .note_service
        .get_owned("new-slug", author.id)
        .await
        .expect("Note should exist under the new slug");
    assert_eq!(note.title, "New title");
    assert_eq!(note.text, "New text");
}

#[tokio::test]
async fn test_non_owner_cannot_edit_note() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.register("reader").await;
    app.create_note(author.id, "Mine", "mine").await;

    let server = app.logged_in("reader").await;
    let response = server
        .post("/notes/mine/edit/")
        .form(&[("title", "Stolen"), ("text", "Text"), ("slug", "mine")])
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let note = app
        .state
        .note_service
        .get_owned("mine", author.id)
        .await
        .expect("Note should be unchanged");
    assert_eq!(note.title, "Mine");
}

#[tokio::test]
async fn test_owner_can_delete_note() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.create_note(author.id, "Gone", "gone").await;

    let server = app.logged_in("author").await;
    let response = server.post("/notes/gone/delete/").await;

    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/notes/done/");
    assert_eq!(app.note_count().await, 0);
}

#[tokio::test]
async fn test_non_owner_cannot_delete_note() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    app.register("reader").await;
    app.create_note(author.id, "Kept", "kept").await;

    let server = app.logged_in("reader").await;
    let response = server.post("/notes/kept/delete/").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.note_count().await, 1);
}

#[tokio::test]
async fn test_notes_list_shows_only_own_notes() {
    let app = TestApp::spawn().await;
    let author = app.register("author").await;
    let reader = app.register("reader").await;
    app.create_note(author.id, "My note", "my-note").await;
    app.create_note(reader.id, "Their note", "their-note").await;

    let server = app.logged_in("author").await;
    let body = server.get("/notes/").await.text();

    assert!(body.contains("My note"));
    assert!(!body.contains("Their note"));
}

// ============================================================================
// Auth flow
// ============================================================================

#[tokio::test]
async fn test_login_follows_next_parameter() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let mut server = app.anonymous();
    server.save_cookies();

    let response = server.get("/notes/add/").await;
    assert_eq!(location(&response), "/auth/login/?next=/notes/add/");

    let response = server
        .post("/auth/login/")
        .form(&[
            ("username", "author"),
            ("password", PASSWORD),
            ("next", "/notes/add/"),
        ])
        .await;
    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/notes/add/");

    // The session cookie now grants access
    let response = server.get("/notes/add/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_bad_credentials_redisplays_form() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let server = app.anonymous();
    let response = server
        .post("/auth/login/")
        .form(&[("username", "author"), ("password", "wrong")])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Invalid username or password"));
}

#[tokio::test]
async fn test_signup_then_login() {
    let app = TestApp::spawn().await;

    let server = app.anonymous();
    let response = server
        .post("/auth/signup/")
        .form(&[("username", "newcomer"), ("password", PASSWORD)])
        .await;
    assert!(response.status_code().is_redirection());
    assert_eq!(location(&response), "/auth/login/");

    let server = app.logged_in("newcomer").await;
    let response = server.get("/notes/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_duplicate_username_redisplays_form() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let server = app.anonymous();
    let response = server
        .post("/auth/signup/")
        .form(&[("username", "author"), ("password", PASSWORD)])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("already taken"));
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let app = TestApp::spawn().await;
    app.register("author").await;

    let server = app.logged_in("author").await;
    let response = server.get("/notes/").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get("/auth/logout/").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get("/notes/").await;
    assert!(
        response.status_code().is_redirection(),
        "Protected pages should redirect after logout"
    );
}

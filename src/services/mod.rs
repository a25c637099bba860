//! Services layer - business logic
//!
//! Services implement the application rules on top of the repositories:
//! authentication and sessions, the comment blocklist, slug generation and
//! uniqueness, and the ownership-scoped access policy for notes and comments.

pub mod comment;
pub mod news;
pub mod note;
pub mod password;
pub mod user;

pub use comment::{CommentService, CommentServiceError, BLOCKED_WORDS, BLOCKED_WORD_WARNING};
pub use news::NewsService;
pub use note::{generate_slug, transliterate, NoteService, NoteServiceError};
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError};

//! Repositories - data access layer
//!
//! Each repository is a trait plus a SQLx implementation over the shared
//! SQLite pool. Services depend on the traits only.

pub mod comment;
pub mod news;
pub mod note;
pub mod session;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use note::{NoteRepository, SqlxNoteRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

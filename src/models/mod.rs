//! Data models
//!
//! Plain data structures shared between the repository, service and web layers.

pub mod comment;
pub mod news;
pub mod note;
pub mod session;
pub mod user;

pub use comment::{Comment, CommentWithAuthor};
pub use news::{CreateNewsInput, News};
pub use note::{Note, NoteInput};
pub use session::Session;
pub use user::User;

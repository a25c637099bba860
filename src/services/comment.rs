//! Comment service
//!
//! Creation and editing run the text through a fixed blocklist; edit and
//! delete are restricted to the comment's author. A non-author gets the
//! same `NotFound` as a missing comment so that existence is not leaked.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{Comment, CommentWithAuthor};

/// Substrings that may not appear in comment text.
pub const BLOCKED_WORDS: &[&str] = &["scoundrel", "villain"];

/// Validation message shown when a blocked word is found.
pub const BLOCKED_WORD_WARNING: &str = "Mind your language!";

/// Error types for comment operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// The comment (or its article) does not exist, or the caller is not
    /// its author
    #[error("Comment not found")]
    NotFound,

    /// The submitted text failed validation; nothing was written
    #[error("{0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
}

impl CommentService {
    pub fn new(comment_repo: Arc<dyn CommentRepository>, news_repo: Arc<dyn NewsRepository>) -> Self {
        Self {
            comment_repo,
            news_repo,
        }
    }

    /// Comments under an article, oldest first. Public.
    pub async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        self.comment_repo.list_for_news(news_id).await
    }

    /// Create a comment under an article on behalf of its author.
    pub async fn create(
        &self,
        news_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        if self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to look up article")?
            .is_none()
        {
            return Err(CommentServiceError::NotFound);
        }

        let text = validated_text(text)?;
        let comment = self
            .comment_repo
            .create(news_id, author_id, text, Utc::now())
            .await
            .context("Failed to create comment")?;
        Ok(comment)
    }

    /// Fetch a comment for its author, for rendering edit/delete pages.
    pub async fn get_owned(
        &self,
        id: i64,
        viewer_id: i64,
    ) -> Result<Comment, CommentServiceError> {
        let comment = self
            .comment_repo
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or(CommentServiceError::NotFound)?;

        // Non-authors get the same answer as a missing comment
        if comment.author_id != viewer_id {
            return Err(CommentServiceError::NotFound);
        }
        Ok(comment)
    }

    /// Replace a comment's text. Author only.
    pub async fn edit(
        &self,
        id: i64,
        editor_id: i64,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        let comment = self.get_owned(id, editor_id).await?;
        let text = validated_text(text)?;

        self.comment_repo
            .update_text(id, text)
            .await
            .context("Failed to update comment")?;

        Ok(Comment {
            text: text.to_string(),
            ..comment
        })
    }

    /// Delete a comment. Author only. Returns the parent article ID for the
    /// post-delete redirect.
    pub async fn delete(&self, id: i64, editor_id: i64) -> Result<i64, CommentServiceError> {
        let comment = self.get_owned(id, editor_id).await?;
        self.comment_repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(comment.news_id)
    }
}

/// Find the first blocked word contained in the text, if any.
pub fn find_blocked_word(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    BLOCKED_WORDS.iter().copied().find(|w| lowered.contains(w))
}

fn validated_text(text: &str) -> Result<&str, CommentServiceError> {
    if text.trim().is_empty() {
        return Err(CommentServiceError::Validation(
            "Comment text is required".to_string(),
        ));
    }
    if find_blocked_word(text).is_some() {
        return Err(CommentServiceError::Validation(
            BLOCKED_WORD_WARNING.to_string(),
        ));
    }
    Ok(text)
}

//! Note service
//!
//! Notes are strictly private to their author. Slugs are unique across the
//! whole collection; a blank slug is generated from the title by
//! transliterating Cyrillic to ASCII and slugifying the result.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repositories::NoteRepository;
use crate::models::{Note, NoteInput};

/// Maximum slug length; generated slugs are truncated to fit.
const MAX_SLUG_LEN: usize = 100;

/// Error types for note operations
#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    /// The note does not exist, or the caller is not its author
    #[error("Note not found")]
    NotFound,

    /// A field failed validation; nothing was written
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl NoteServiceError {
    fn slug_taken(slug: &str) -> Self {
        Self::Validation {
            field: "slug",
            message: format!("Slug \"{slug}\" already exists, pick a unique value"),
        }
    }

    fn required(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: format!("The {field} field is required"),
        }
    }
}

/// Note service
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
}

impl NoteService {
    pub fn new(repo: Arc<dyn NoteRepository>) -> Self {
        Self { repo }
    }

    /// All notes owned by one author; never anyone else's.
    pub async fn list_for(&self, author_id: i64) -> Result<Vec<Note>> {
        self.repo.list_for(author_id).await
    }

    /// Create a note for an author.
    ///
    /// A blank slug is derived from the title; a duplicate slug is a
    /// validation failure and nothing is written.
    pub async fn create(
        &self,
        author_id: i64,
        input: &NoteInput,
    ) -> Result<Note, NoteServiceError> {
        let (title, text, slug) = validated_fields(input)?;

        if self
            .repo
            .slug_exists(&slug)
            .await
            .context("Failed to check slug")?
        {
            return Err(NoteServiceError::slug_taken(&slug));
        }

        // The existence check races with concurrent creates; the UNIQUE
        // constraint is the authority.
        match self.repo.create(author_id, title, text, &slug).await {
            Ok(note) => Ok(note),
            Err(err) if is_unique_violation(&err) => Err(NoteServiceError::slug_taken(&slug)),
            Err(err) => Err(NoteServiceError::Internal(err)),
        }
    }

    /// Fetch a note by slug for its owner. Anyone else's slug, or a missing
    /// one, is `NotFound`.
    pub async fn get_owned(&self, slug: &str, author_id: i64) -> Result<Note, NoteServiceError> {
        self.repo
            .get_by_slug_for(slug, author_id)
            .await
            .context("Failed to get note")?
            .ok_or(NoteServiceError::NotFound)
    }

    /// Update a note. Owner only; the new slug must stay unique.
    pub async fn update(
        &self,
        slug: &str,
        author_id: i64,
        input: &NoteInput,
    ) -> Result<Note, NoteServiceError> {
        let note = self.get_owned(slug, author_id).await?;
        let (title, text, new_slug) = validated_fields(input)?;

        if new_slug != note.slug
            && self
                .repo
                .slug_exists(&new_slug)
                .await
                .context("Failed to check slug")?
        {
            return Err(NoteServiceError::slug_taken(&new_slug));
        }

        match self.repo.update(note.id, title, text, &new_slug).await {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(NoteServiceError::slug_taken(&new_slug))
            }
            Err(err) => return Err(NoteServiceError::Internal(err)),
        }

        Ok(Note {
            title: title.to_string(),
            text: text.to_string(),
            slug: new_slug,
            ..note
        })
    }

    /// Delete a note. Owner only.
    pub async fn delete(&self, slug: &str, author_id: i64) -> Result<(), NoteServiceError> {
        let note = self.get_owned(slug, author_id).await?;
        self.repo
            .delete(note.id)
            .await
            .context("Failed to delete note")?;
        Ok(())
    }
}

/// Whether a repository error is a slug UNIQUE-constraint violation.
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn validated_fields<'a>(
    input: &'a NoteInput,
) -> Result<(&'a str, &'a str, String), NoteServiceError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(NoteServiceError::required("title"));
    }
    let text = input.text.trim();
    if text.is_empty() {
        return Err(NoteServiceError::required("text"));
    }

    let slug = input.slug.trim();
    let slug = if slug.is_empty() {
        generate_slug(title)
    } else {
        slug.to_string()
    };
    if slug.len() > MAX_SLUG_LEN {
        return Err(NoteServiceError::Validation {
            field: "slug",
            message: format!("Slug must be at most {MAX_SLUG_LEN} characters"),
        });
    }

    Ok((title, text, slug))
}

/// Transliteration table for Cyrillic letters.
static CYRILLIC: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    let pairs: &[(char, &str)] = &[
        ('а', "a"), ('б', "b"), ('в', "v"), ('г', "g"), ('д', "d"),
        ('е', "e"), ('ё', "yo"), ('ж', "zh"), ('з', "z"), ('и', "i"),
        ('й', "j"), ('к', "k"), ('л', "l"), ('м', "m"), ('н', "n"),
        ('о', "o"), ('п', "p"), ('р', "r"), ('с', "s"), ('т', "t"),
        ('у', "u"), ('ф', "f"), ('х', "h"), ('ц', "c"), ('ч', "ch"),
        ('ш', "sh"), ('щ', "sch"), ('ъ', ""), ('ы', "y"), ('ь', ""),
        ('э', "e"), ('ю', "yu"), ('я', "ya"),
    ];
    pairs.iter().copied().collect()
});

/// Replace Cyrillic letters with Latin equivalents, preserving everything
/// else.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        match CYRILLIC.get(&lower) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

/// Generate a URL-safe slug from a title.
///
/// Cyrillic is transliterated first; the result is lowercased, non-alphanumeric
/// runs collapse to single hyphens, and the slug is truncated to the maximum
/// length without a trailing hyphen.
pub fn generate_slug(title: &str) -> String {
    let transliterated = transliterate(title).to_lowercase();

    let mut result = String::new();
    let mut prev_hyphen = false;
    for c in transliterated.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen && !result.is_empty() {
            result.push('-');
            prev_hyphen = true;
        }
    }

    let truncated = if result.len() > MAX_SLUG_LEN {
        &result[..MAX_SLUG_LEN]
    } else {
        &result
    };
    truncated.trim_end_matches('-').to_string()
}

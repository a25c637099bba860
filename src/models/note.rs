//! Note model

use serde::{Deserialize, Serialize};

/// Note entity
///
/// Notes are private: only the owning author may list, view, edit or delete
/// them. The slug is unique across the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: i64,
}

/// Form payload for creating or editing a note
///
/// An empty slug means "generate one from the title".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

//! Note records exchanged with the note store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who can see a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Team,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Team => "team",
            Self::Private => "private",
        }
    }
}

/// Search hit: the minimum a link target needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
}

/// A tag attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A full note record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,

    /// URL-safe form of the title; links resolve through it
    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub is_favorite: bool,

    #[serde(default)]
    pub tags: Vec<Tag>,

    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

/// Data for creating a new note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            visibility: Visibility::default(),
        }
    }

    /// The note the creation flow opens for a link that has no target yet
    pub fn from_link(title: impl Into<String>) -> Self {
        let title = title.into();
        let content = format!("# {}\n\nStart writing here...", title);
        Self::new(title, content)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Lower-case, dash-separated form of a title
///
/// Runs of anything other than alphanumerics collapse into one `-`, and
/// leading/trailing dashes are dropped, so `"Q3  Plan!"` becomes `"q3-plan"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Q3  Plan!"), "q3-plan");
        assert_eq!(slugify("  Engineering Notes "), "engineering-notes");
        assert_eq!(slugify("Ünïcode Title"), "ünïcode-title");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_new_note_from_link() {
        let note = NewNote::from_link("Ghost");
        assert_eq!(note.title, "Ghost");
        assert_eq!(note.content, "# Ghost\n\nStart writing here...");
        assert_eq!(note.visibility, Visibility::Team);
    }

    #[test]
    fn test_note_deserializes_with_defaults() {
        let json = r#"{"id": 7, "title": "Plan", "updated_at": "2024-01-01T00:00:00Z"}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.id, NoteId(7));
        assert_eq!(note.visibility, Visibility::Team);
        assert!(note.tags.is_empty());
    }
}

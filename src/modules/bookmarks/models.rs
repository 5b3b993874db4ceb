use serde::{Deserialize, Serialize};

/// Store-assigned bookmark key. Never reused after deletion.
pub type BookmarkId = i64;

/// Domain model for a stored bookmark.
///
/// Absent `description`/`rating` serialize as `null`; the keys are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Unique identifier assigned at creation
    pub id: BookmarkId,
    /// Non-empty title
    pub title: String,
    /// Absolute http(s) URL
    pub url: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Optional rating in `0..=5`
    pub rating: Option<u8>,
}

/// Validated payload for creating a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub rating: Option<u8>,
}

/// Validated partial update.
///
/// The outer `Option` says whether the field was supplied; for nullable
/// fields the inner `Option` is the new value, `None` clearing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<Option<String>>,
    pub rating: Option<Option<u8>>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.rating.is_none()
    }

    /// Apply the supplied fields onto `bookmark`, leaving the rest untouched.
    pub fn apply_to(&self, bookmark: &mut Bookmark) {
        if let Some(title) = &self.title {
            bookmark.title = title.clone();
        }
        if let Some(url) = &self.url {
            bookmark.url = url.clone();
        }
        if let Some(description) = &self.description {
            bookmark.description = description.clone();
        }
        if let Some(rating) = self.rating {
            bookmark.rating = rating;
        }
    }
}

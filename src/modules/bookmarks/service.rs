//! Bookmark use cases exposed to the HTTP boundary.
//!
//! Validation always runs before the first write, so a rejected payload never
//! reaches the store. Everything handed back to a caller passes through the
//! sanitizer first.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::models::{Bookmark, BookmarkId};
use super::repository::{BookmarkRepository, RepoError};
use super::sanitizer::sanitize_bookmark;
use super::validator::{validate_create, validate_update, ValidationError};

pub const NOT_FOUND_MESSAGE: &str = "Bookmark doesn't exist";

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound(BookmarkId),

    #[error("bookmark store failure")]
    Store(#[source] RepoError),
}

impl From<RepoError> for BookmarkError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, BookmarkError>;

/// Orchestrates validator, repository, and sanitizer.
#[derive(Clone)]
pub struct BookmarkService {
    repo: Arc<dyn BookmarkRepository>,
}

impl BookmarkService {
    pub fn new(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self { repo }
    }

    /// All bookmarks, sanitized.
    pub async fn list(&self) -> ServiceResult<Vec<Bookmark>> {
        let bookmarks = self.repo.list_all().await?;
        Ok(bookmarks.into_iter().map(sanitize_bookmark).collect())
    }

    pub async fn get(&self, id: BookmarkId) -> ServiceResult<Bookmark> {
        let bookmark = self.repo.get_by_id(id).await.inspect_err(|err| {
            log_lookup_failure(id, err);
        })?;
        Ok(sanitize_bookmark(bookmark))
    }

    /// Validate and store a new bookmark, returning the sanitized stored row.
    pub async fn add(&self, payload: &Value) -> ServiceResult<Bookmark> {
        let new_bookmark = validate_create(payload).inspect_err(|err| {
            tracing::warn!(code = err.code(), error = %err, "rejected bookmark create");
        })?;

        let bookmark = self.repo.create(new_bookmark).await?;
        tracing::info!(bookmark_id = bookmark.id, "bookmark created");

        Ok(sanitize_bookmark(bookmark))
    }

    /// Merge the supplied fields onto an existing bookmark.
    pub async fn patch(&self, id: BookmarkId, payload: &Value) -> ServiceResult<()> {
        self.require(id).await?;

        let patch = validate_update(payload).inspect_err(|err| {
            tracing::warn!(bookmark_id = id, code = err.code(), error = %err, "rejected bookmark update");
        })?;

        let updated = self.repo.update_by_id(id, patch).await?;
        tracing::info!(bookmark_id = id, updated, "bookmark updated");

        Ok(())
    }

    pub async fn remove(&self, id: BookmarkId) -> ServiceResult<()> {
        self.require(id).await?;

        let deleted = self.repo.delete_by_id(id).await?;
        tracing::info!(bookmark_id = id, deleted, "bookmark deleted");

        Ok(())
    }

    /// Fails with `NotFound` unless a bookmark with `id` is stored.
    pub async fn require(&self, id: BookmarkId) -> ServiceResult<()> {
        self.repo.get_by_id(id).await.inspect_err(|err| {
            log_lookup_failure(id, err);
        })?;
        Ok(())
    }
}

fn log_lookup_failure(id: BookmarkId, err: &RepoError) {
    match err {
        RepoError::NotFound(_) => tracing::warn!(bookmark_id = id, "bookmark not found"),
        other => tracing::error!(bookmark_id = id, error = %other, "bookmark lookup failed"),
    }
}

//! Bookmark persistence.
//!
//! The repository stores raw, unsanitized input; sanitizing is a read-time
//! concern of the service. Every operation touches one row and runs inside a
//! single `Database::call`, which holds the connection exclusively, so a
//! partial update can never interleave with a concurrent delete.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_db::{Database, DbError};
use thiserror::Error;

use super::models::{Bookmark, BookmarkId, BookmarkPatch, NewBookmark};
use super::validator::MAX_RATING;

const BOOKMARK_SELECT_SQL: &str = "SELECT id, title, url, description, rating FROM bookmarks";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("bookmark not found: {0}")]
    NotFound(BookmarkId),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid persisted bookmark data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence boundary for bookmarks.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// All bookmarks in insertion order.
    async fn list_all(&self) -> RepoResult<Vec<Bookmark>>;

    async fn get_by_id(&self, id: BookmarkId) -> RepoResult<Bookmark>;

    /// Persist `bookmark` and return the stored row with its assigned id.
    async fn create(&self, bookmark: NewBookmark) -> RepoResult<Bookmark>;

    /// Merge the supplied fields onto the stored row; returns rows updated.
    async fn update_by_id(&self, id: BookmarkId, patch: BookmarkPatch) -> RepoResult<usize>;

    /// Returns rows deleted.
    async fn delete_by_id(&self, id: BookmarkId) -> RepoResult<usize>;
}

/// SQLite-backed bookmark repository.
#[derive(Clone)]
pub struct SqliteBookmarkRepository {
    database: Database,
}

impl SqliteBookmarkRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl BookmarkRepository for SqliteBookmarkRepository {
    async fn list_all(&self) -> RepoResult<Vec<Bookmark>> {
        self.database
            .call(|conn| -> RepoResult<Vec<Bookmark>> {
                let mut stmt = conn.prepare(&format!("{BOOKMARK_SELECT_SQL} ORDER BY id ASC"))?;
                let mut rows = stmt.query([])?;
                let mut bookmarks = Vec::new();

                while let Some(row) = rows.next()? {
                    bookmarks.push(parse_bookmark_row(row)?);
                }

                Ok(bookmarks)
            })
            .await
    }

    async fn get_by_id(&self, id: BookmarkId) -> RepoResult<Bookmark> {
        self.database
            .call(move |conn| -> RepoResult<Bookmark> {
                find_bookmark(conn, id)?.ok_or(RepoError::NotFound(id))
            })
            .await
    }

    async fn create(&self, bookmark: NewBookmark) -> RepoResult<Bookmark> {
        self.database
            .call(move |conn| -> RepoResult<Bookmark> {
                conn.execute(
                    "INSERT INTO bookmarks (title, url, description, rating)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        bookmark.title,
                        bookmark.url,
                        bookmark.description,
                        bookmark.rating,
                    ],
                )?;

                Ok(Bookmark {
                    id: conn.last_insert_rowid(),
                    title: bookmark.title,
                    url: bookmark.url,
                    description: bookmark.description,
                    rating: bookmark.rating,
                })
            })
            .await
    }

    async fn update_by_id(&self, id: BookmarkId, patch: BookmarkPatch) -> RepoResult<usize> {
        self.database
            .call(move |conn| -> RepoResult<usize> {
                let tx = conn.transaction()?;

                let mut bookmark = find_bookmark(&tx, id)?.ok_or(RepoError::NotFound(id))?;
                patch.apply_to(&mut bookmark);

                let changed = tx.execute(
                    "UPDATE bookmarks
                     SET title = ?1, url = ?2, description = ?3, rating = ?4
                     WHERE id = ?5;",
                    params![
                        bookmark.title,
                        bookmark.url,
                        bookmark.description,
                        bookmark.rating,
                        id,
                    ],
                )?;
                tx.commit()?;

                Ok(changed)
            })
            .await
    }

    async fn delete_by_id(&self, id: BookmarkId) -> RepoResult<usize> {
        self.database
            .call(move |conn| -> RepoResult<usize> {
                let changed = conn.execute("DELETE FROM bookmarks WHERE id = ?1;", [id])?;
                if changed == 0 {
                    return Err(RepoError::NotFound(id));
                }
                Ok(changed)
            })
            .await
    }
}

fn find_bookmark(conn: &Connection, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
    let mut stmt = conn.prepare(&format!("{BOOKMARK_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_bookmark_row(row)))
        .optional()?;

    row.transpose()
}

fn parse_bookmark_row(row: &Row<'_>) -> RepoResult<Bookmark> {
    let id: BookmarkId = row.get("id")?;

    let rating = match row.get::<_, Option<i64>>("rating")? {
        Some(value) if (0..=i64::from(MAX_RATING)).contains(&value) => Some(value as u8),
        Some(value) => {
            return Err(RepoError::InvalidData(format!(
                "invalid rating `{value}` in bookmarks.rating for id {id}"
            )));
        }
        None => None,
    };

    Ok(Bookmark {
        id,
        title: row.get("title")?,
        url: row.get("url")?,
        description: row.get("description")?,
        rating,
    })
}

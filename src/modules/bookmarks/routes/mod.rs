//! HTTP handlers for `/api/bookmarks`.

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use shelf_http::error::AppError;

use super::models::{Bookmark, BookmarkId};
use super::service::{BookmarkError, BookmarkService, NOT_FOUND_MESSAGE};

impl From<BookmarkError> for AppError {
    fn from(value: BookmarkError) -> Self {
        match value {
            BookmarkError::Invalid(err) => AppError::bad_request_with_code(err.to_string(), err.code()),
            BookmarkError::NotFound(_) => AppError::not_found(NOT_FOUND_MESSAGE),
            BookmarkError::Store(err) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

/// Bookmark routes, relative to the module mount point.
pub fn router(service: BookmarkService) -> Router {
    Router::new()
        .route("/", get(list_bookmarks).post(create_bookmark))
        .route(
            "/{id}",
            get(get_bookmark)
                .patch(update_bookmark)
                .delete(delete_bookmark),
        )
        .with_state(service)
}

async fn list_bookmarks(
    State(service): State<BookmarkService>,
) -> Result<Json<Vec<Bookmark>>, AppError> {
    Ok(Json(service.list().await?))
}

async fn get_bookmark(
    State(service): State<BookmarkService>,
    Path(raw_id): Path<String>,
) -> Result<Json<Bookmark>, AppError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(service.get(id).await?))
}

async fn create_bookmark(
    State(service): State<BookmarkService>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(reject_body)?;
    let bookmark = service.add(&payload).await?;

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), bookmark.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(bookmark),
    ))
}

async fn update_bookmark(
    State(service): State<BookmarkService>,
    Path(raw_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw_id)?;
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            // A missing bookmark wins over an unreadable body.
            service.require(id).await?;
            return Err(reject_body(rejection));
        }
    };

    service.patch(id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_bookmark(
    State(service): State<BookmarkService>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw_id)?;

    service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ids that cannot name a stored row are reported as missing, not malformed.
fn parse_id(raw: &str) -> Result<BookmarkId, AppError> {
    raw.parse::<BookmarkId>()
        .map_err(|_| AppError::not_found(NOT_FOUND_MESSAGE))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

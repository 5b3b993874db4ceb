//! Request payload validation for bookmarks.
//!
//! Create and update share one set of per-field checks. They differ only in
//! which fields must be present: create needs `title` and `url`, update needs
//! at least one of the four editable fields. Fields absent from an update are
//! never checked or defaulted.

use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use super::models::{BookmarkPatch, NewBookmark};

pub const MAX_RATING: u8 = 5;

/// Reasons a payload is rejected. Messages are returned to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing {0} in request body")]
    MissingField(&'static str),

    #[error("'{field}' must be a {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("'url' must be a valid URL")]
    InvalidUrl,

    #[error("'rating' must be an integer between 0 and 5")]
    InvalidRating,

    #[error("Request body must contain either 'title', 'url', 'description' or 'rating'")]
    EmptyUpdate,

    #[error("Request body must be a JSON object")]
    NotAnObject,
}

impl ValidationError {
    /// Stable machine-readable code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidType { .. } => "invalid_type",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidRating => "invalid_rating",
            Self::EmptyUpdate => "empty_update",
            Self::NotAnObject => "not_an_object",
        }
    }
}

/// Validate a full create payload.
pub fn validate_create(payload: &Value) -> Result<NewBookmark, ValidationError> {
    let fields = as_object(payload)?;

    let title = required_text(fields.get("title"), "title")?;
    let url = required_text(fields.get("url"), "url")?;
    check_url(&url)?;

    let description = match fields.get("description") {
        Some(value) => parse_description(value)?,
        None => None,
    };
    let rating = match fields.get("rating") {
        Some(value) => parse_rating(value)?,
        None => None,
    };

    Ok(NewBookmark {
        title,
        url,
        description,
        rating,
    })
}

/// Validate a partial update, returning only the fields the caller supplied.
pub fn validate_update(payload: &Value) -> Result<BookmarkPatch, ValidationError> {
    let fields = as_object(payload)?;

    let title = match fields.get("title") {
        Some(value) => Some(required_text(Some(value), "title")?),
        None => None,
    };
    let url = match fields.get("url") {
        Some(value) => {
            let url = required_text(Some(value), "url")?;
            check_url(&url)?;
            Some(url)
        }
        None => None,
    };
    let description = fields.get("description").map(parse_description).transpose()?;
    let rating = fields.get("rating").map(parse_rating).transpose()?;

    let patch = BookmarkPatch {
        title,
        url,
        description,
        rating,
    };
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }

    Ok(patch)
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or(ValidationError::NotAnObject)
}

/// Present, non-blank string, returned trimmed. `null` and `""` count as missing.
fn required_text(value: Option<&Value>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(ValidationError::MissingField(field))
        }
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "string",
        }),
    }
}

/// Absolute web URL: http(s) scheme and a host. No network check.
fn check_url(candidate: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(candidate).map_err(|_| ValidationError::InvalidUrl)?;

    let web_scheme = matches!(parsed.scheme(), "http" | "https");
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());

    if web_scheme && has_host {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl)
    }
}

/// `null` and `""` both mean "no description".
fn parse_description(value: &Value) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        _ => Err(ValidationError::InvalidType {
            field: "description",
            expected: "string",
        }),
    }
}

/// `null` means unrated; otherwise an integral number in `0..=5`.
fn parse_rating(value: &Value) -> Result<Option<u8>, ValidationError> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(number) => number,
        _ => return Err(ValidationError::InvalidRating),
    };

    let integral = match number.as_i64() {
        Some(int) => Some(int),
        None => number
            .as_f64()
            .filter(|float| float.fract() == 0.0 && float.is_finite())
            .map(|float| float as i64),
    };

    match integral {
        Some(int) if (0..=i64::from(MAX_RATING)).contains(&int) => Ok(Some(int as u8)),
        _ => Err(ValidationError::InvalidRating),
    }
}

pub mod models;
pub mod repository;
pub mod routes;
pub mod sanitizer;
pub mod service;
pub mod validator;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_db::Database;
use shelf_kernel::{InitCtx, Migration, Module};

use repository::{BookmarkRepository, SqliteBookmarkRepository};
use service::BookmarkService;

const SCHEMA_INIT: &str = r#"
    CREATE TABLE IF NOT EXISTS bookmarks (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL CHECK (title <> ''),
        url         TEXT NOT NULL CHECK (url <> ''),
        description TEXT,
        rating      INTEGER CHECK (rating BETWEEN 0 AND 5)
    );
"#;

/// Bookmark CRUD mounted under `/api/bookmarks`.
pub struct BookmarksModule {
    service: BookmarkService,
}

impl BookmarksModule {
    pub fn new(repo: impl BookmarkRepository + 'static) -> Self {
        Self {
            service: BookmarkService::new(Arc::new(repo)),
        }
    }

    /// Schema migrations owning the `bookmarks` table.
    pub fn schema() -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: SCHEMA_INIT,
        }]
    }
}

#[async_trait]
impl Module for BookmarksModule {
    fn name(&self) -> &'static str {
        "bookmarks"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "bookmarks module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        });
        let bookmark_id = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List bookmarks",
                        "tags": ["Bookmarks"],
                        "responses": {
                            "200": {
                                "description": "Every stored bookmark, sanitized",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Bookmark" }
                                        }
                                    }
                                }
                            },
                            "500": { "description": "Internal server error", "content": error_response }
                        }
                    },
                    "post": {
                        "summary": "Create a bookmark",
                        "tags": ["Bookmarks"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBookmark" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created; `Location` points at the new bookmark",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Bookmark" }
                                    }
                                }
                            },
                            "400": { "description": "Invalid payload", "content": error_response },
                            "500": { "description": "Internal server error", "content": error_response }
                        }
                    }
                },
                "/{id}": {
                    "parameters": [bookmark_id],
                    "get": {
                        "summary": "Fetch a bookmark",
                        "tags": ["Bookmarks"],
                        "responses": {
                            "200": {
                                "description": "The bookmark, sanitized",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Bookmark" }
                                    }
                                }
                            },
                            "404": { "description": "Bookmark doesn't exist", "content": error_response }
                        }
                    },
                    "patch": {
                        "summary": "Update some fields of a bookmark",
                        "tags": ["Bookmarks"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBookmark" }
                                }
                            }
                        },
                        "responses": {
                            "204": { "description": "Updated" },
                            "400": { "description": "Invalid or empty payload", "content": error_response },
                            "404": { "description": "Bookmark doesn't exist", "content": error_response }
                        }
                    },
                    "delete": {
                        "summary": "Delete a bookmark",
                        "tags": ["Bookmarks"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": { "description": "Bookmark doesn't exist", "content": error_response }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Bookmark": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "url": { "type": "string", "format": "uri" },
                            "description": { "type": "string", "nullable": true },
                            "rating": { "type": "integer", "minimum": 0, "maximum": 5, "nullable": true }
                        },
                        "required": ["id", "title", "url", "description", "rating"]
                    },
                    "CreateBookmark": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1 },
                            "url": { "type": "string", "format": "uri" },
                            "description": { "type": "string", "nullable": true },
                            "rating": { "type": "integer", "minimum": 0, "maximum": 5, "nullable": true }
                        },
                        "required": ["title", "url"]
                    },
                    "UpdateBookmark": {
                        "type": "object",
                        "description": "At least one property must be present",
                        "properties": {
                            "title": { "type": "string", "minLength": 1 },
                            "url": { "type": "string", "format": "uri" },
                            "description": { "type": "string", "nullable": true },
                            "rating": { "type": "integer", "minimum": 0, "maximum": 5, "nullable": true }
                        },
                        "minProperties": 1
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        Self::schema()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookmarks module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookmarks module stopped");
        Ok(())
    }
}

/// Create the bookmarks module backed by `database`.
pub fn create_module(database: Database) -> Arc<dyn Module> {
    Arc::new(BookmarksModule::new(SqliteBookmarkRepository::new(database)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_contributes_schema_migration() {
        let module = create_module(Database::open_in_memory().unwrap());

        assert_eq!(module.name(), "bookmarks");
        assert_eq!(module.migrations(), BookmarksModule::schema());
        assert_eq!(module.migrations()[0].id, "001_init");
    }

    #[test]
    fn openapi_fragment_describes_every_route() {
        let module = create_module(Database::open_in_memory().unwrap());
        let spec = module.openapi().unwrap();

        for method in ["get", "post"] {
            assert!(spec["paths"]["/"][method].is_object(), "missing {method} /");
        }
        for method in ["get", "patch", "delete"] {
            assert!(spec["paths"]["/{id}"][method].is_object(), "missing {method} /{{id}}");
        }
        assert!(spec["components"]["schemas"]["Bookmark"].is_object());
    }
}

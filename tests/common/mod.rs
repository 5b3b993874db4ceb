//! Shared helpers for endpoint tests: an in-memory application and the
//! bookmark fixtures it can be seeded with.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use serde_json::{json, Value};
use shelf_app::modules::bookmarks::models::Bookmark;
use shelf_app::Application;
use shelf_db::{Database, DbError};
use shelf_kernel::settings::Settings;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub database: Database,
}

impl TestApp {
    /// Fully migrated application over a private in-memory store.
    pub async fn new() -> Self {
        let settings = Settings::default();
        let database = Database::open_in_memory().unwrap();
        let app = Application::build_with_database(&settings, database)
            .await
            .unwrap();

        Self {
            router: app.router(&settings),
            database: app.database,
        }
    }

    pub async fn seeded() -> Self {
        let app = Self::new().await;
        app.insert(bookmarks_fixture()).await;
        app
    }

    /// Insert rows directly, bypassing validation, with their fixture ids.
    pub async fn insert(&self, bookmarks: Vec<Bookmark>) {
        self.database
            .call(move |conn| -> Result<(), DbError> {
                for bookmark in &bookmarks {
                    conn.execute(
                        "INSERT INTO bookmarks (id, title, url, description, rating)
                         VALUES (?1, ?2, ?3, ?4, ?5);",
                        rusqlite::params![
                            bookmark.id,
                            bookmark.title,
                            bookmark.url,
                            bookmark.description,
                            bookmark.rating,
                        ],
                    )?;
                }
                Ok(())
            })
            .await
            .unwrap();
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send `body` verbatim as a JSON request body.
    pub async fn send_raw(&self, method: Method, uri: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Method::GET, uri, None).await
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn not_found_body() -> Value {
    json!({ "error": { "message": "Bookmark doesn't exist" } })
}

fn bookmark(id: i64, title: &str, url: &str, description: &str, rating: u8) -> Bookmark {
    Bookmark {
        id,
        title: title.to_string(),
        url: url.to_string(),
        description: Some(description.to_string()),
        rating: Some(rating),
    }
}

pub fn bookmarks_fixture() -> Vec<Bookmark> {
    vec![
        bookmark(
            1,
            "Arsène Lupin",
            "https://taobao.com",
            "Mauris enim leo, rhoncus sed, vestibulum sit amet, cursus id, turpis. Integer aliquet, massa id lobortis convallis, tortor risus dapibus augue, vel accumsan tellus nisi eu orci. Mauris lacinia sapien quis libero.",
            3,
        ),
        bookmark(
            2,
            "Bulworth",
            "http://paypal.com",
            "In hac habitasse platea dictumst. Etiam faucibus cursus urna. Ut tellus.",
            5,
        ),
        bookmark(
            3,
            "Pearl, The (La perla)",
            "http://bizjournals.com",
            "Nullam sit amet turpis elementum ligula vehicula consequat. Morbi a ipsum. Integer a nibh.",
            4,
        ),
        bookmark(
            4,
            "Amazing Grace and Chuck",
            "https://hostgator.com",
            "Quisque id justo sit amet sapien dignissim vestibulum. Vestibulum ante ipsum primis in faucibus orci luctus et ultrices posuere cubilia Curae; Nulla dapibus dolor vel est. Donec odio justo, sollicitudin ut, suscipit a, feugiat et, eros.",
            1,
        ),
        bookmark(
            5,
            "Thirteen Ghosts (a.k.a. Thir13en Ghosts)",
            "https://bandcamp.com",
            "Curabitur in libero ut massa volutpat convallis. Morbi odio odio, elementum eu, interdum eu, tincidunt in, leo. Maecenas pulvinar lobortis est.",
            2,
        ),
    ]
}

/// Stored XSS payload and the form it must be served in.
pub fn malicious_bookmark() -> (Bookmark, Bookmark) {
    let stored = bookmark(
        666,
        r#"Naughty naughty very naughty <script>alert("xss");</script>"#,
        "www.twitter.com",
        r#"Bad image <img src="https://url.to.file.which/does-not.exist" onerror="alert(document.cookie);">. But not <strong>all</strong> bad."#,
        2,
    );
    let expected = Bookmark {
        title: r#"Naughty naughty very naughty &lt;script&gt;alert("xss");&lt;/script&gt;"#.to_string(),
        description: Some(
            r#"Bad image <img src="https://url.to.file.which/does-not.exist">. But not <strong>all</strong> bad."#
                .to_string(),
        ),
        ..stored.clone()
    };
    (stored, expected)
}

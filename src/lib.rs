//! shelf application library
//!
//! Wires the bookmark module onto the shared kernel, database, and HTTP
//! crates. Binaries and integration tests build an [`Application`] and hand
//! its registry to `shelf_http`.

pub mod modules;

use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, ModuleRegistry};

/// Initialized modules plus the database they share.
pub struct Application {
    pub registry: ModuleRegistry,
    pub database: Database,
}

impl Application {
    /// Open the configured database, then initialize and migrate every module.
    pub async fn build(settings: &Settings) -> anyhow::Result<Self> {
        let database = Database::open(&settings.database).with_context(|| {
            format!("failed to open database at '{}'", settings.database.path)
        })?;

        Self::build_with_database(settings, database).await
    }

    /// Same as [`Application::build`] but over an already opened database.
    pub async fn build_with_database(settings: &Settings, database: Database) -> anyhow::Result<Self> {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &database);

        let ctx = InitCtx { settings };
        registry.init_all(&ctx).await?;

        let applied = database
            .migrate(registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "database migrations complete");

        Ok(Self { registry, database })
    }

    /// HTTP router serving every registered module.
    pub fn router(&self, settings: &Settings) -> axum::Router {
        shelf_http::build_router(&self.registry, settings)
    }
}

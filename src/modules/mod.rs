pub mod bookmarks;

use shelf_db::Database;
use shelf_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, database: &Database) {
    registry.register(bookmarks::create_module(database.clone()));
}

use anyhow::{anyhow, Context, Result};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::db::repositories::DBPool;

pub mod schema;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies any pending embedded migrations.
pub fn run_migrations(pool: &DBPool) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection for migrations")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;
    for version in applied {
        info!(%version, "Applied migration");
    }
    Ok(())
}

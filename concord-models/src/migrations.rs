use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::{Connection, Error, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies every migration that hasn't been run on this database yet.
pub fn run_pending(conn: &mut Connection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Migration(e.to_string()))?;
    for version in applied {
        info!("Applied migration {}", version);
    }
    Ok(())
}

/// Whether this database lags behind the migrations shipped with this build.
pub fn is_pending(conn: &mut Connection) -> Result<bool> {
    conn.has_pending_migration(MIGRATIONS)
        .map_err(|e| Error::Migration(e.to_string()))
}

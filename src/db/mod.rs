pub mod migrations;
pub mod queries;
pub mod schedule;

use anyhow::Context;
use rusqlite::Connection;

pub use schedule::SqliteSchedule;

/// Opens the booking store at `path` (`:memory:` for an ephemeral one) and brings the
/// schema up to date.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open booking store at {path}"))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")
        .context("failed to configure booking store")?;

    migrations::run_migrations(&conn)?;
    tracing::debug!(path, "booking store ready");

    Ok(conn)
}

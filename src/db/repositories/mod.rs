use anyhow::{Context, Result};
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};

// Define the common DBPool type alias, making it available to submodules
pub type DBPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DBConn = PooledConnection<ConnectionManager<PgConnection>>;

pub mod commits;
pub mod join_requests;
pub mod project_members;
pub mod projects;
pub mod users;

pub(crate) fn checkout(pool: &DBPool) -> Result<DBConn> {
    pool.get().context("Failed to get DB connection")
}

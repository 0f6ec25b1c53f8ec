use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use tracing::{info, instrument};

use crate::TARGET_DB;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Get access to the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connect to PostgreSQL. A failure here is fatal to the run; the
    /// caller surfaces it before any tile is fetched.
    #[instrument(target = "db_query", level = "info", skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        info!(target: TARGET_DB, "Creating database pool");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        info!(target: TARGET_DB, "Database pool created");
        Ok(Database { pool })
    }
}

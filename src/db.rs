use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::errors::{EtlError, ResultExt};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Opens a single-connection pool; both programs run strictly sequentially.
    pub async fn connect(database_url: &str) -> Result<Self, EtlError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("connecting to database")?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("probing database connection")?;

        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

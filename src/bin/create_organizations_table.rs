//! Drops and recreates `public.organizations` with its fixed schema.
//!
//! Errors are logged and the process still exits normally.

use organizations_etl::config::EtlConfig;
use organizations_etl::db::Database;
use organizations_etl::errors::EtlError;
use organizations_etl::obs;
use organizations_etl::schema::{self, TableDef, ORGANIZATIONS};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    obs::init_tracing();

    let table = ORGANIZATIONS;
    tracing::info!("--- Starting schema creation for table '{}' ---", table.name);

    let config = EtlConfig::from_env();

    match create_table(&config, &table).await {
        Ok(()) => tracing::info!(
            "✅ Success! Table '{}' created",
            table.qualified_name()
        ),
        Err(e) => tracing::error!("❌ Error while creating the schema: {}", e),
    }
}

async fn create_table(config: &EtlConfig, table: &TableDef) -> Result<(), EtlError> {
    let url = config.database_url()?;
    let db = Database::connect(&url).await?;
    tracing::info!("🔌 Connection established. Running DDL...");

    let result = schema::recreate_table(&db.pool, table).await;

    db.close().await;
    tracing::info!("🔌 Connection closed");
    result
}

//! Replaces the rows of `public.organizations` with
//! `data/processed/organizations.csv`.
//!
//! A missing input file stops the run before connecting. Every other error is
//! logged after the connection is released. The process exits normally in
//! all cases.

use organizations_etl::config::EtlConfig;
use organizations_etl::errors::EtlError;
use organizations_etl::loader;
use organizations_etl::obs;
use organizations_etl::schema::ORGANIZATIONS;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    obs::init_tracing();

    let table = ORGANIZATIONS;
    tracing::info!("--- Starting load for table '{}' ---", table.name);

    let config = EtlConfig::from_env();

    match loader::run_load(&config, &table).await {
        Ok(count) => tracing::info!(
            "✅ Success! {} rows loaded into '{}'",
            count,
            table.qualified_name()
        ),
        Err(e) if e.is_file_not_found() => {
            tracing::error!("❌ ERROR: {}.csv was not found at the expected path ({})", table.name, e)
        }
        Err(e @ EtlError::MissingHeader) => {
            tracing::error!("❌ ERROR: {}.csv is empty ({})", table.name, e)
        }
        Err(e) => tracing::error!("❌ Error during the database operation: {}", e),
    }
}

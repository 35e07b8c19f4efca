//! Organizations ETL
//!
//! Library behind two one-off utilities for the `public.organizations`
//! table in PostgreSQL:
//!
//! - `create_organizations_table` drops and recreates the table.
//! - `load_organizations` replaces its rows with the contents of
//!   `data/processed/organizations.csv`.
//!
//! # Modules
//!
//! - `config`: Connection settings and paths from the environment.
//! - `csv_source`: Reading the `;`-delimited input file.
//! - `db`: Database connection management.
//! - `errors`: Error handling types.
//! - `loader`: Preparing typed rows and the truncate-then-insert load.
//! - `obs`: Logging setup.
//! - `schema`: Table definition and DDL.

pub mod config;
pub mod csv_source;
pub mod db;
pub mod errors;
pub mod loader;
pub mod obs;
pub mod schema;

//! Replaces the contents of a table with the rows of a CSV file.
//!
//! Loading happens in two phases:
//!
//! 1. [`LoadPlan::prepare`] maps the CSV header onto the table definition and
//!    converts every cell to a typed [`CellValue`]. Nothing touches the
//!    database here.
//! 2. [`replace_table_contents`] truncates the table and inserts the plan in
//!    multi-row batches, all inside one transaction.
//!
//! [`run_load`] strings both together with file reading and connection
//! management.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::EtlConfig;
use crate::csv_source::{self, CsvData};
use crate::db::Database;
use crate::errors::{EtlError, ResultExt};
use crate::schema::{ColumnDef, ColumnType, TableDef};

/// PostgreSQL rejects statements with more bind parameters than this.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// A single cell converted to its column's type. `None` is SQL `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(Option<String>),
    Integer(Option<i32>),
    Numeric(Option<BigDecimal>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Text(v) => v.is_none(),
            CellValue::Integer(v) => v.is_none(),
            CellValue::Numeric(v) => v.is_none(),
        }
    }

    /// Converts a raw CSV field.
    ///
    /// Empty fields become `NULL`. Text keeps whitespace-only values as they
    /// are; numeric columns also treat all-whitespace fields as `NULL`.
    pub fn parse(raw: &str, column: &ColumnDef) -> Result<Self, String> {
        let trimmed = raw.trim();

        match column.sql_type {
            ColumnType::Text => Ok(CellValue::Text((!raw.is_empty()).then(|| raw.to_string()))),
            ColumnType::VarChar(max_len) => {
                if raw.is_empty() {
                    return Ok(CellValue::Text(None));
                }
                // PostgreSQL truncates excess trailing spaces instead of failing.
                let len = raw.trim_end_matches(' ').chars().count();
                if len > max_len as usize {
                    return Err(format!(
                        "value is {} characters long, column allows {}",
                        len, max_len
                    ));
                }
                Ok(CellValue::Text(Some(raw.to_string())))
            }
            ColumnType::Integer => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Integer(None));
                }
                trimmed
                    .parse::<i32>()
                    .map(|v| CellValue::Integer(Some(v)))
                    .map_err(|e| format!("not an integer ({})", e))
            }
            ColumnType::Numeric { precision, scale } => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Numeric(None));
                }
                let value = BigDecimal::from_str(trimmed)
                    .map_err(|e| format!("not a decimal number ({})", e))?;
                let (_, exponent) = value.as_bigint_and_exponent();
                if exponent > MAX_NUMERIC_SCALE {
                    return Err(format!(
                        "{} fractional digits exceed the NUMERIC limit of {}",
                        exponent, MAX_NUMERIC_SCALE
                    ));
                }
                let allowed = precision.saturating_sub(scale) as usize;
                let digits = integer_digits(&value);
                if digits > allowed {
                    return Err(format!(
                        "{} integer digits exceed NUMERIC({}, {})",
                        digits, precision, scale
                    ));
                }
                Ok(CellValue::Numeric(Some(value)))
            }
        }
    }
}

/// Largest scale a PostgreSQL NUMERIC accepts.
const MAX_NUMERIC_SCALE: i64 = 16_383;

/// Number of digits left of the decimal point, ignoring sign. Zero for |v| < 1.
///
/// Works from the digit count and exponent so huge exponents stay cheap.
fn integer_digits(value: &BigDecimal) -> usize {
    let (int_val, exponent) = value.as_bigint_and_exponent();
    if int_val.sign() == bigdecimal::num_bigint::Sign::NoSign {
        return 0;
    }
    let digits = value.digits() as i64 - exponent;
    digits.max(0) as usize
}

/// Typed rows ready to insert, with the target columns in CSV order.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub columns: Vec<&'static ColumnDef>,
    pub rows: Vec<Vec<CellValue>>,
}

impl LoadPlan {
    pub fn prepare(table: &TableDef, csv: &CsvData) -> Result<Self, EtlError> {
        let mut columns: Vec<&'static ColumnDef> = Vec::with_capacity(csv.columns.len());
        for name in &csv.columns {
            let column = table.column(name).ok_or_else(|| EtlError::UnknownColumn {
                column: name.clone(),
                table: table.qualified_name(),
            })?;
            if columns.iter().any(|c| c.name == column.name) {
                return Err(EtlError::DuplicateColumn(column.name.to_string()));
            }
            columns.push(column);
        }

        let mut rows = Vec::with_capacity(csv.records.len());
        for (idx, record) in csv.records.iter().enumerate() {
            let row = columns
                .iter()
                .zip(record.iter())
                .map(|(column, raw)| {
                    CellValue::parse(raw, column).map_err(|reason| EtlError::InvalidValue {
                        row: idx + 1,
                        column: column.name.to_string(),
                        value: raw.to_string(),
                        reason,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows per `INSERT` statement, bounded by the bind-parameter limit.
    pub fn rows_per_statement(&self) -> usize {
        rows_per_statement(self.columns.len())
    }
}

pub fn rows_per_statement(column_count: usize) -> usize {
    if column_count == 0 {
        0
    } else {
        (MAX_BIND_PARAMS / column_count).max(1)
    }
}

/// Truncates `table` (resetting identity) and inserts every row of `plan`,
/// in a single transaction. Returns the number of rows inserted.
///
/// On error the transaction is dropped without commit, which rolls back the
/// truncate along with any batch already sent.
pub async fn replace_table_contents(
    pool: &PgPool,
    table: &TableDef,
    plan: &LoadPlan,
) -> Result<u64, EtlError> {
    let mut tx = pool.begin().await.context("starting transaction")?;
    tracing::info!("Connection established. Preparing table {}", table.qualified_name());

    tracing::info!("Clearing existing rows");
    sqlx::query(&table.truncate_sql())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("truncating {}", table.qualified_name()))?;

    let batch_size = plan.rows_per_statement();
    let mut inserted: u64 = 0;

    if batch_size > 0 && !plan.is_empty() {
        tracing::info!(
            "Loading {} new rows ({} per statement)",
            plan.len(),
            batch_size
        );

        let column_list = plan
            .columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ");

        for (batch_no, chunk) in plan.rows.chunks(batch_size).enumerate() {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                table.qualified_name(),
                column_list
            ));

            qb.push_values(chunk, |mut b, row| {
                for cell in row {
                    match cell {
                        CellValue::Text(v) => b.push_bind(v.clone()),
                        CellValue::Integer(v) => b.push_bind(*v),
                        CellValue::Numeric(v) => b.push_bind(v.clone()),
                    };
                }
            });

            let result = qb
                .build()
                .execute(&mut *tx)
                .await
                .with_context(|| format!("inserting batch {}", batch_no + 1))?;
            inserted += result.rows_affected();
            tracing::debug!("Batch {} inserted {} rows", batch_no + 1, result.rows_affected());
        }
    }

    tx.commit().await.context("committing load")?;
    Ok(inserted)
}

/// Reads the table's CSV from the project's data directory and replaces the
/// table contents with it.
///
/// Fails with [`EtlError::FileNotFound`] before any connection is attempted
/// when the file is missing. The connection pool is closed on every path
/// after it was opened.
pub async fn run_load(config: &EtlConfig, table: &TableDef) -> Result<u64, EtlError> {
    let path = csv_source::csv_path(&config.project_root, table.name);
    tracing::info!("Looking for file at: {}", path.display());

    let csv = csv_source::read_csv(&path)?;
    tracing::info!("File found. {} records read", csv.len());
    tracing::info!("Column names normalized to lower case");

    let plan = LoadPlan::prepare(table, &csv)?;

    let url = config.database_url()?;
    let db = Database::connect(&url).await?;
    let result = replace_table_contents(&db.pool, table, &plan).await;
    db.close().await;
    tracing::info!("Database connection closed");

    result
}

//! Declarative definition of the `public.organizations` table and the DDL
//! the schema initializer runs against it.

use std::fmt;

use sqlx::PgPool;

use crate::errors::{EtlError, ResultExt};

/// SQL type of a column, as far as the loader needs to know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `VARCHAR(n)`
    VarChar(u32),
    /// `TEXT`
    Text,
    /// `INTEGER`
    Integer,
    /// `NUMERIC(precision, scale)`
    Numeric { precision: u32, scale: u32 },
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::VarChar(len) => write!(f, "VARCHAR({})", len),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Numeric { precision, scale } => {
                write!(f, "NUMERIC({}, {})", precision, scale)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: ColumnType,
    pub primary_key: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: ColumnType) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub schema: &'static str,
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

/// The `public.organizations` table.
pub const ORGANIZATIONS: TableDef = TableDef {
    schema: "public",
    name: "organizations",
    columns: &[
        ColumnDef::new("id", ColumnType::VarChar(36)).primary_key(),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("address", ColumnType::Text),
        ColumnDef::new("city", ColumnType::VarChar(50)),
        ColumnDef::new("state", ColumnType::VarChar(10)),
        ColumnDef::new("zip", ColumnType::Integer),
        ColumnDef::new(
            "lat",
            ColumnType::Numeric {
                precision: 17,
                scale: 15,
            },
        ),
        ColumnDef::new(
            "lon",
            ColumnType::Numeric {
                precision: 17,
                scale: 15,
            },
        ),
        ColumnDef::new("phone", ColumnType::VarChar(30)),
        ColumnDef::new(
            "revenue",
            ColumnType::Numeric {
                precision: 15,
                scale: 2,
            },
        ),
        ColumnDef::new("utilization", ColumnType::Integer),
    ],
};

impl TableDef {
    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.qualified_name())
    }

    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.primary_key {
                    format!("    {} {} PRIMARY KEY", c.name, c.sql_type)
                } else {
                    format!("    {} {}", c.name, c.sql_type)
                }
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!("CREATE TABLE {} (\n{}\n)", self.qualified_name(), columns)
    }

    /// Empties the table and resets any identity sequence.
    pub fn truncate_sql(&self) -> String {
        format!("TRUNCATE TABLE {} RESTART IDENTITY", self.qualified_name())
    }
}

/// Drops the table if it exists and creates it again, in one transaction.
///
/// Destroys any existing data. Running it twice leaves an empty table.
pub async fn recreate_table(pool: &PgPool, table: &TableDef) -> Result<(), EtlError> {
    let mut tx = pool.begin().await.context("starting transaction")?;

    tracing::info!("Dropping {} if it exists", table.qualified_name());
    sqlx::query(&table.drop_table_sql())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("dropping {}", table.qualified_name()))?;

    tracing::info!("Creating {}", table.qualified_name());
    sqlx::query(&table.create_table_sql())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("creating {}", table.qualified_name()))?;

    tx.commit().await.context("committing schema changes")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizations_has_eleven_columns_in_order() {
        let names: Vec<_> = ORGANIZATIONS.columns.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "name",
                "address",
                "city",
                "state",
                "zip",
                "lat",
                "lon",
                "phone",
                "revenue",
                "utilization"
            ]
        );
    }

    #[test]
    fn only_id_is_primary_key() {
        let pks: Vec<_> = ORGANIZATIONS
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name)
            .collect();
        assert_eq!(pks, vec!["id"]);
    }

    #[test]
    fn column_lookup_ignores_case() {
        assert_eq!(ORGANIZATIONS.column("NAME").map(|c| c.name), Some("name"));
        assert_eq!(ORGANIZATIONS.column("Zip").map(|c| c.sql_type), Some(ColumnType::Integer));
        assert!(ORGANIZATIONS.column("country").is_none());
    }
}

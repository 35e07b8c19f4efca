use std::fmt;
use std::path::PathBuf;

/// Errors raised by the schema initializer and the data loader.
#[derive(Debug)]
pub enum EtlError {
    /// The input CSV does not exist. Detected before any database work.
    FileNotFound(PathBuf),
    /// The CSV could not be read or parsed.
    Csv(csv::Error),
    /// The CSV has no header row (e.g. a zero-byte file).
    MissingHeader,
    /// A CSV header names a column the target table does not have.
    UnknownColumn { column: String, table: String },
    /// Two CSV headers normalize to the same column name.
    DuplicateColumn(String),
    /// A cell could not be converted to its column's type.
    InvalidValue {
        /// 1-based data row number (header excluded).
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
    /// Connection settings could not be turned into a URL.
    Config(String),
    /// Database-related errors.
    Database(sqlx::Error),
    /// Error with context chain for better debugging.
    WithContext {
        source: Box<EtlError>,
        context: String,
    },
}

impl EtlError {
    /// True for the "input file not found" failure, including when wrapped in context.
    pub fn is_file_not_found(&self) -> bool {
        match self {
            EtlError::FileNotFound(_) => true,
            EtlError::WithContext { source, .. } => source.is_file_not_found(),
            _ => false,
        }
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtlError::FileNotFound(path) => {
                write!(f, "Input file not found: {}", path.display())
            }
            EtlError::Csv(e) => write!(f, "CSV error: {}", e),
            EtlError::MissingHeader => write!(f, "CSV file has no header row"),
            EtlError::UnknownColumn { column, table } => {
                write!(f, "Column '{}' does not exist in table {}", column, table)
            }
            EtlError::DuplicateColumn(column) => {
                write!(f, "Column '{}' appears more than once in the CSV header", column)
            }
            EtlError::InvalidValue {
                row,
                column,
                value,
                reason,
            } => write!(
                f,
                "Invalid value '{}' for column '{}' in row {}: {}",
                value, column, row, reason
            ),
            EtlError::Config(msg) => write!(f, "Configuration error: {}", msg),
            EtlError::Database(e) => write!(f, "Database error: {}", e),
            EtlError::WithContext { source, context } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for EtlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtlError::Csv(e) => Some(e),
            EtlError::Database(e) => Some(e),
            EtlError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for EtlError {
    fn from(err: sqlx::Error) -> Self {
        EtlError::Database(err)
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::Csv(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `EtlError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, EtlError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, EtlError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, EtlError> {
    fn context(self, context: impl Into<String>) -> Result<T, EtlError> {
        self.map_err(|e| EtlError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, EtlError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| EtlError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, EtlError> {
        self.map_err(|e| EtlError::WithContext {
            source: Box::new(EtlError::Database(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, EtlError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| EtlError::WithContext {
            source: Box::new(EtlError::Database(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_survives_context() {
        let err: Result<(), EtlError> =
            Err(EtlError::FileNotFound(PathBuf::from("data/processed/x.csv")));
        let wrapped = err.context("reading input").unwrap_err();
        assert!(wrapped.is_file_not_found());
        assert_eq!(
            wrapped.to_string(),
            "reading input: Input file not found: data/processed/x.csv"
        );
    }

    #[test]
    fn other_errors_are_not_file_not_found() {
        let err = EtlError::DuplicateColumn("name".to_string());
        assert!(!err.is_file_not_found());
        let err = EtlError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_file_not_found());
    }

    #[test]
    fn sqlx_errors_get_context() {
        let res: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = res.with_context(|| "truncating public.organizations".to_string());
        let msg = err.unwrap_err().to_string();
        assert!(msg.starts_with("truncating public.organizations: Database error"));
    }
}

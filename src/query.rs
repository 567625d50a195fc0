use std::fmt;
use std::path::Path;

use rusqlite::types::{ToSql, ValueRef};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Could not open the expense store at {path}: {message}")]
    Connectivity { path: String, message: String },

    #[error("Database error executing query: {0}")]
    Query(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl QueryError {
    fn from_sqlite(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => QueryError::Unexpected(err.to_string()),
            other => QueryError::Query(other.to_string()),
        }
    }
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn from_sql(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(r) => CellValue::Real(r),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Text(format!("<{} bytes>", b.len())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Real(r) => write!(f, "{r:.2}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Named columns and rows, in the order SQLite returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let idx = self.column_index(name);
        self.rows.iter().filter_map(move |row| idx.and_then(|i| row.get(i)))
    }

    /// Value of `name` in the first row.
    pub fn first(&self, name: &str) -> Option<&CellValue> {
        self.column(name).next()
    }

    /// Stable sort of rows by the rank of their `column` value. Values the
    /// ranking does not know sort last.
    pub fn reorder_by<F>(&mut self, column: &str, rank: F)
    where
        F: Fn(&str) -> Option<usize>,
    {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        self.rows.sort_by_key(|row| {
            row.get(idx)
                .and_then(CellValue::as_str)
                .and_then(&rank)
                .unwrap_or(usize::MAX)
        });
    }
}

/// Open the store read-only, hand the connection to `f`, and close it again
/// however `f` exits. A missing file is a connectivity error, never a new
/// empty database.
pub fn with_store<T, F>(db_path: &Path, f: F) -> QueryResult<T>
where
    F: FnOnce(&Connection) -> rusqlite::Result<T>,
{
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| QueryError::Connectivity {
        path: db_path.display().to_string(),
        message: e.to_string(),
    })?;

    let out = f(&conn).map_err(QueryError::from_sqlite);
    if let Err(e) = &out {
        tracing::warn!(error = %e, "query failed");
    }
    out
}

/// The single path every report read goes through. An empty `Table` always
/// means the statement ran and matched nothing; failures come back as a
/// tagged [`QueryError`].
pub fn run_query(db_path: &Path, sql: &str, params: &[&dyn ToSql]) -> QueryResult<Table> {
    tracing::debug!(sql, params = params.len(), "running query");
    let result = with_store(db_path, |conn| {
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut table = Table::new(columns);

        let mut rows = stmt.query(params)?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(CellValue::from_sql(row.get_ref(i)?));
            }
            table.rows.push(cells);
        }
        Ok(table)
    });
    if let Err(QueryError::Connectivity { .. }) = &result {
        tracing::warn!(path = %db_path.display(), "expense store unavailable");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, load_expenses};
    use crate::models::{Category, Expense, PaymentMode};
    use chrono::NaiveDate;

    fn expense(date: &str, category: Category, mode: PaymentMode, amount: f64, cashback: f64) -> Expense {
        Expense {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category,
            payment_mode: mode,
            description: None,
            amount_paid: amount,
            cashback,
        }
    }

    fn fixture_store(expenses: &[Expense]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");
        let mut conn = get_connection(&path).unwrap();
        load_expenses(&mut conn, expenses).unwrap();
        (dir, path)
    }

    fn three_rows() -> Vec<Expense> {
        vec![
            expense("2024-01-01", Category::Groceries, PaymentMode::Cash, 500.0, 0.0),
            expense("2024-01-01", Category::Groceries, PaymentMode::Online, 300.0, 5.0),
            expense("2024-01-02", Category::FoodAndDining, PaymentMode::Online, 200.0, 0.0),
        ]
    }

    #[test]
    fn test_select_all_materializes_rows() {
        let (_dir, path) = fixture_store(&three_rows());
        let table = run_query(&path, "SELECT * FROM expenses", &[]).unwrap();
        assert_eq!(
            table.columns,
            vec!["Date", "Category", "Payment_Mode", "Description", "Amount_Paid", "Cashback"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1][0], CellValue::Text("2024-01-01".into()));
        assert_eq!(table.rows[1][1], CellValue::Text("Groceries".into()));
        assert_eq!(table.rows[1][3], CellValue::Null);
        assert_eq!(table.rows[1][4], CellValue::Real(300.0));
        assert_eq!(table.rows[1][5], CellValue::Real(5.0));
    }

    #[test]
    fn test_bound_parameters() {
        let (_dir, path) = fixture_store(&three_rows());
        let table = run_query(
            &path,
            "SELECT COUNT(*) AS n FROM expenses WHERE Category = ?1",
            &[&"Groceries"],
        )
        .unwrap();
        assert_eq!(table.first("n"), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn test_empty_table_is_not_an_error() {
        let (_dir, path) = fixture_store(&[]);
        let table = run_query(&path, "SELECT * FROM expenses", &[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 6);
    }

    #[test]
    fn test_missing_store_is_connectivity_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.db");
        let err = run_query(&path, "SELECT * FROM expenses", &[]).unwrap_err();
        assert!(matches!(err, QueryError::Connectivity { .. }), "got {err:?}");
        assert!(!path.exists(), "read-only open must not create the file");
    }

    #[test]
    fn test_bad_sql_is_query_error() {
        let (_dir, path) = fixture_store(&three_rows());
        let err = run_query(&path, "SELECT nope FROM expenses", &[]).unwrap_err();
        assert!(matches!(err, QueryError::Query(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Database error executing query"));
    }

    #[test]
    fn test_store_is_read_only() {
        let (_dir, path) = fixture_store(&three_rows());
        let err = run_query(&path, "DELETE FROM expenses", &[]).unwrap_err();
        assert!(matches!(err, QueryError::Query(_)));
        let table = run_query(&path, "SELECT * FROM expenses", &[]).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_conversion_failure_is_unexpected() {
        let (_dir, path) = fixture_store(&three_rows());
        let err = with_store(&path, |conn| {
            conn.query_row("SELECT Category FROM expenses", [], |r| r.get::<_, i64>(0))
        })
        .unwrap_err();
        assert!(matches!(err, QueryError::Unexpected(_)), "got {err:?}");
    }

    #[test]
    fn test_reorder_by_rank_puts_unknown_last() {
        let mut table = Table::new(vec!["Day".into(), "n".into()]);
        for (day, n) in [("Zday", 0), ("Tuesday", 2), ("Monday", 1)] {
            table.rows.push(vec![CellValue::Text(day.into()), CellValue::Integer(n)]);
        }
        let order = ["Monday", "Tuesday"];
        table.reorder_by("Day", |d| order.iter().position(|o| *o == d));
        let days: Vec<_> = table.column("Day").filter_map(CellValue::as_str).collect();
        assert_eq!(days, vec!["Monday", "Tuesday", "Zday"]);
    }
}

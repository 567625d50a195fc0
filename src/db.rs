use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::Expense;

pub const TABLE: &str = "expenses";

pub const SCHEMA: &str = "
DROP TABLE IF EXISTS expenses;

CREATE TABLE expenses (
    Date TEXT NOT NULL,
    Category TEXT NOT NULL,
    Payment_Mode TEXT NOT NULL,
    Description TEXT,
    Amount_Paid REAL NOT NULL,
    Cashback REAL DEFAULT 0.0
);
";

/// Read-write connection used by the loader. Creates the file if missing.
pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Connection::open(db_path)?)
}

/// Replace the `expenses` table with `expenses`, keeping input order.
/// Returns the number of rows written.
pub fn load_expenses(conn: &mut Connection, expenses: &[Expense]) -> Result<usize> {
    conn.execute_batch(SCHEMA)?;
    tracing::info!(table = TABLE, "table recreated");

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO expenses (Date, Category, Payment_Mode, Description, Amount_Paid, Cashback) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for e in expenses {
            stmt.execute(rusqlite::params![
                e.date,
                e.category,
                e.payment_mode,
                e.description,
                e.amount_paid,
                e.cashback,
            ])?;
        }
    }
    tx.commit()?;

    tracing::info!(rows = expenses.len(), "expenses loaded");
    Ok(expenses.len())
}

pub fn count_expenses(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM expenses", [], |r| r.get(0))?)
}

/// The first `limit` rows in insertion order.
pub fn preview(conn: &Connection, limit: usize) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT Date, Category, Payment_Mode, Description, Amount_Paid, Cashback \
         FROM expenses ORDER BY rowid LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], |row| {
        Ok(Expense {
            date: row.get(0)?,
            category: row.get(1)?,
            payment_mode: row.get(2)?,
            description: row.get(3)?,
            amount_paid: row.get(4)?,
            cashback: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

use crate::error::Result;
use crate::fmt::{money, number};
use crate::query::{run_query, QueryError};
use crate::settings::resolve_db_path;

const SUMMARY_SQL: &str = "SELECT COUNT(*) AS Records, MIN(Date) AS First, MAX(Date) AS Last, \
     COALESCE(SUM(Amount_Paid), 0.0) AS Spent, COALESCE(SUM(Cashback), 0.0) AS Cashback FROM expenses";

pub fn run(db: Option<&str>) -> Result<()> {
    let db_path = resolve_db_path(db);
    println!("Database:   {}", db_path.display());

    let table = match run_query(&db_path, SUMMARY_SQL, &[]) {
        Ok(table) => table,
        Err(QueryError::Connectivity { .. }) => {
            println!();
            println!("Database not found. Run `expense-tracker setup` to create it.");
            return Ok(());
        }
        Err(e) => {
            println!();
            println!("{e}");
            return Ok(());
        }
    };

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {} bytes", number(size as i64));

    let records = table.first("Records").and_then(|v| v.as_f64()).unwrap_or(0.0) as i64;
    println!();
    println!("Records:    {}", number(records));
    if records > 0 {
        let first = table.first("First").map(|v| v.to_string()).unwrap_or_default();
        let last = table.first("Last").map(|v| v.to_string()).unwrap_or_default();
        let spent = table.first("Spent").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let cashback = table.first("Cashback").and_then(|v| v.as_f64()).unwrap_or(0.0);
        println!("Span:       {first} to {last}");
        println!("Spent:      {}", money(spent));
        println!("Cashback:   {}", money(cashback));
    }
    Ok(())
}

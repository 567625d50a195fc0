use colored::Colorize;

use crate::db::{count_expenses, get_connection, load_expenses, preview, TABLE};
use crate::error::Result;
use crate::settings::resolve_db_path;

use super::{expense_table, generate};

const PREVIEW_ROWS: usize = 5;

pub fn run(months: u32, start_year: i32, seed: Option<u64>, db: Option<&str>) -> Result<()> {
    let db_path = resolve_db_path(db);

    let expenses = generate(months, start_year, seed)?;
    println!(
        "Expense data generated: {} records. Proceeding to database loading.",
        expenses.len()
    );

    let mut conn = get_connection(&db_path)?;
    load_expenses(&mut conn, &expenses)?;
    println!("Table '{TABLE}' created in {}.", db_path.display());
    let stored = count_expenses(&conn)?;
    println!("Successfully loaded {stored} records into '{TABLE}' table.");
    println!("{}", "Database setup complete.".green().bold());

    let rows = preview(&conn, PREVIEW_ROWS)?;
    println!();
    println!("Verifying data in the database (first {PREVIEW_ROWS} rows):");
    println!("{}", expense_table(&rows));
    Ok(())
}

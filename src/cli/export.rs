use crate::error::Result;

use super::{expense_table, generate};

pub fn run(output: &str, months: u32, start_year: i32, seed: Option<u64>) -> Result<()> {
    let expenses = generate(months, start_year, seed)?;

    let mut writer = csv::Writer::from_path(output)?;
    for expense in &expenses {
        writer.serialize(expense)?;
    }
    writer.flush()?;

    println!("Generated {} expense records.", expenses.len());
    println!("Data saved to {output} (for inspection).");
    if !expenses.is_empty() {
        let head = &expenses[..expenses.len().min(5)];
        println!("\nFirst rows:\n{}", expense_table(head));
    }
    Ok(())
}

pub mod export;
pub mod init;
pub mod serve;
pub mod setup;
pub mod status;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::fmt::money;
use crate::generator::{generate_expenses, MAX_MONTHS};
use crate::models::Expense;

/// Generate a batch, reproducibly when a seed is given.
pub(crate) fn generate(months: u32, start_year: i32, seed: Option<u64>) -> Result<Vec<Expense>> {
    match seed {
        Some(seed) => generate_expenses(months, start_year, &mut StdRng::seed_from_u64(seed)),
        None => generate_expenses(months, start_year, &mut rand::thread_rng()),
    }
}

pub(crate) fn expense_table(rows: &[Expense]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Category", "Payment Mode", "Description", "Amount Paid", "Cashback"]);
    for e in rows {
        table.add_row(vec![
            Cell::new(e.date),
            Cell::new(e.category),
            Cell::new(e.payment_mode),
            Cell::new(e.description.as_deref().unwrap_or_default()),
            Cell::new(money(e.amount_paid)),
            Cell::new(money(e.cashback)),
        ]);
    }
    table
}

#[derive(Parser)]
#[command(
    name = "expense-tracker",
    about = "Generate synthetic personal expenses and explore them in a web dashboard."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and dashboard port, saved to the settings file.
    Init {
        /// Directory holding expenses.db (default: ~/Documents/expense-tracker)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Port the dashboard listens on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a year of expenses and load them into the store, replacing its contents.
    Setup {
        /// Number of calendar months to generate
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=MAX_MONTHS as i64))]
        months: u32,
        /// Year the window starts in (January 1st)
        #[arg(long = "start-year", default_value_t = 2024)]
        start_year: i32,
        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
        /// Store path (overrides the settings file)
        #[arg(long)]
        db: Option<String>,
    },
    /// Write a generated batch to CSV without touching the store.
    Export {
        /// Output CSV file
        #[arg(long, short, default_value = "generated_expenses.csv")]
        output: String,
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=MAX_MONTHS as i64))]
        months: u32,
        #[arg(long = "start-year", default_value_t = 2024)]
        start_year: i32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Start the dashboard web server (the default).
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        db: Option<String>,
    },
    /// Show the store location, row count, date span and totals.
    Status {
        #[arg(long)]
        db: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_setup_defaults() {
        let cli = Cli::try_parse_from(["expense-tracker", "setup"]).unwrap();
        match cli.command {
            Some(Commands::Setup { months, start_year, seed, db }) => {
                assert_eq!(months, 12);
                assert_eq!(start_year, 2024);
                assert_eq!(seed, None);
                assert_eq!(db, None);
            }
            _ => panic!("expected setup"),
        }
    }

    #[test]
    fn test_months_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["expense-tracker", "setup", "--months", "1000000"]).is_err());
        assert!(Cli::try_parse_from(["expense-tracker", "export", "--months", "0"]).is_err());
        assert!(Cli::try_parse_from(["expense-tracker", "setup", "--months", "1200"]).is_ok());
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["expense-tracker"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_seeded_generation_repeats() {
        let a = generate(2, 2024, Some(11)).unwrap();
        let b = generate(2, 2024, Some(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expense_table_rows() {
        let rows = generate(1, 2024, Some(3)).unwrap();
        let table = expense_table(&rows[..2.min(rows.len())]);
        assert_eq!(table.row_iter().count(), 2.min(rows.len()));
    }
}

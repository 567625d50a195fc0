mod cli;
mod dataset;
mod db;
mod error;
mod fmt;
mod generator;
mod models;
mod query;
mod reports;
mod settings;
mod web;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Init { data_dir, port }) => cli::init::run(data_dir, port),
        Some(Commands::Setup {
            months,
            start_year,
            seed,
            db,
        }) => cli::setup::run(months, start_year, seed, db.as_deref()),
        Some(Commands::Export {
            output,
            months,
            start_year,
            seed,
        }) => cli::export::run(&output, months, start_year, seed),
        Some(Commands::Serve { port, db }) => cli::serve::run(port, db.as_deref()),
        Some(Commands::Status { db }) => cli::status::run(db.as_deref()),
        None => cli::serve::run(None, None),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

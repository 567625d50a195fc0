use std::net::SocketAddr;

use colored::Colorize;

use crate::error::{Result, TrackerError};
use crate::settings::{load_settings, resolve_db_path};
use crate::web::{self, AppState};

pub fn run(port: Option<u16>, db: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let db_path = resolve_db_path(db);
    let port = port.unwrap_or(settings.port);
    let addr: SocketAddr = format!("{}:{port}", settings.host)
        .parse()
        .map_err(|e| TrackerError::Settings(format!("invalid listen address {}:{port}: {e}", settings.host)))?;

    if !db_path.exists() {
        println!(
            "{}",
            format!("No store at {}. Run `expense-tracker setup` first.", db_path.display()).yellow()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    println!("Dashboard running at {}", format!("http://{addr}").bold());
    runtime.block_on(web::serve(AppState::new(db_path), addr))?;
    Ok(())
}

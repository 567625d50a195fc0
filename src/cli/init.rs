use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        let expanded = PathBuf::from(shellexpand_path(&dir));
        settings.data_dir = std::fs::canonicalize(&expanded)
            .unwrap_or(expanded)
            .to_string_lossy()
            .to_string();
    }
    if let Some(port) = port {
        settings.port = port;
    }

    std::fs::create_dir_all(&settings.data_dir)?;
    save_settings(&settings)?;

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", settings.db_path().display());
    println!("Dashboard:  http://{}:{}", settings.host, settings.port);
    println!();
    println!("Run `expense-tracker setup` to generate data.");
    Ok(())
}

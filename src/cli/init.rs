use colored::Colorize;

use crate::error::Result;
use crate::loader::{CONTACTS_FILE, INVOICES_FILE, PAYMENTS_FILE};
use crate::settings::{save_settings, shellexpand_path, Settings};

/// Persist the data directory and lay out its input/ and output/
/// subdirectories.
pub fn run(data_dir: Option<String>) -> Result<()> {
    let dir = shellexpand_path(data_dir.as_deref().unwrap_or("data"));
    let path = std::path::Path::new(&dir);
    std::fs::create_dir_all(path.join("input"))?;
    std::fs::create_dir_all(path.join("output"))?;

    save_settings(&Settings {
        data_dir: dir.clone(),
    })?;

    println!("{} Data directory set to {dir}", "\u{2713}".green());
    println!("\nPlace the Zoho Books exports in {dir}/input/:");
    for file in [CONTACTS_FILE, INVOICES_FILE, PAYMENTS_FILE] {
        println!("  - {file}");
    }
    println!("\nThen run `feesum summary`.");
    Ok(())
}

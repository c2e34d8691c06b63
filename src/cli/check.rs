use colored::Colorize;

use crate::cli::resolve_data_dir;
use crate::error::Result;
use crate::loader::load_tables;

/// Load the three exports and print record counts, without generating a
/// report. A quick sanity check after dropping new files in place.
pub fn run(data_dir: Option<String>) -> Result<()> {
    let dir = resolve_data_dir(data_dir.as_deref());
    let tables = load_tables(&dir)?;

    println!("{} Data files loaded from {}", "\u{2713}".green(), dir.display());
    println!("  - Contacts:  {} records", tables.contacts.len());
    println!("  - Invoices:  {} line items", tables.invoice_items.len());
    println!("  - Payments:  {} records", tables.payments.len());
    Ok(())
}

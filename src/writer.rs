use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::SummaryRow;

/// Column order and names are a compatibility contract with downstream
/// spreadsheet consumers. Do not reorder.
pub const OUTPUT_COLUMNS: [&str; 7] = [
    "Grade",
    "Section",
    "School",
    "Opening Balance",
    "Initial Fee",
    "Month",
    "Term / Monthly Fee",
];

/// Write the summary as UTF-8 CSV with a byte order mark, which Excel needs
/// to pick the right encoding.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(OUTPUT_COLUMNS)?;
    for row in rows {
        let opening = format!("{:.2}", row.opening_balance);
        let initial = format!("{:.2}", row.initial_fee);
        let term = format!("{:.2}", row.term_monthly_fee);
        wtr.write_record([
            row.grade.as_str(),
            row.section.as_str(),
            row.school.as_str(),
            opening.as_str(),
            initial.as_str(),
            row.month.as_str(),
            term.as_str(),
        ])?;
    }
    wtr.flush()?;
    log::info!("Summary saved to {}", path.display());
    Ok(())
}

/// Default output path: `<data_dir>/output/income_summary_<timestamp>.csv`.
pub fn default_output_path(data_dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    data_dir
        .join("output")
        .join(format!("income_summary_{timestamp}.csv"))
}

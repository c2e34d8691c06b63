use std::path::PathBuf;

use colored::Colorize;
use comfy_table::Table;

use crate::cli::{parse_month, resolve_data_dir};
use crate::error::Result;
use crate::fmt::money;
use crate::loader::load_tables;
use crate::models::SummaryRow;
use crate::summary::{generate_monthly_report, generate_summary, SummaryFilter};
use crate::writer::{default_output_path, write_summary, OUTPUT_COLUMNS};

pub struct SummaryArgs {
    pub month: Option<String>,
    pub year: Option<i32>,
    pub school: Option<String>,
    pub output: Option<String>,
    pub no_write: bool,
    pub data_dir: Option<String>,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let dir = resolve_data_dir(args.data_dir.as_deref());
    let tables = load_tables(&dir)?;

    let filter = SummaryFilter {
        month: args.month.as_deref().map(parse_month).transpose()?,
        year: args.year,
    };
    let mut rows = match (&filter.month, filter.year) {
        (Some(month), Some(year)) => generate_monthly_report(&tables, month, year),
        _ => generate_summary(&tables, &filter),
    };

    // School filtering happens after aggregation; it only narrows the view.
    if let Some(school) = &args.school {
        rows.retain(|r| r.school == *school);
    }

    if rows.is_empty() {
        println!("No data found for the selected filters.");
        return Ok(());
    }

    println!("{}", format_table(&rows));
    print_statistics(&rows);

    if !args.no_write {
        let path = match &args.output {
            Some(p) => PathBuf::from(p),
            None => default_output_path(&dir),
        };
        write_summary(&rows, &path)?;
        println!("{} Output saved to: {}", "\u{2713}".green(), path.display());
    }
    Ok(())
}

fn format_table(rows: &[SummaryRow]) -> String {
    let mut table = Table::new();
    table.set_header(OUTPUT_COLUMNS.to_vec());
    for row in rows {
        table.add_row(vec![
            row.grade.clone(),
            row.section.clone(),
            row.school.clone(),
            money(row.opening_balance),
            money(row.initial_fee),
            row.month.clone(),
            money(row.term_monthly_fee),
        ]);
    }
    table.to_string()
}

fn print_statistics(rows: &[SummaryRow]) {
    let opening: f64 = rows.iter().map(|r| r.opening_balance).sum();
    let initial: f64 = rows.iter().map(|r| r.initial_fee).sum();
    let term: f64 = rows.iter().map(|r| r.term_monthly_fee).sum();

    println!("\n{}", "Summary Statistics:".bold());
    println!("- Total rows: {}", rows.len());
    println!("- Total Opening Balance: {}", money(opening));
    println!("- Total Initial Fee: {}", money(initial));
    println!("- Total Term/Monthly Fee: {}", money(term));
}

pub mod check;
pub mod init;
pub mod summary;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::{FeesumError, Result};
use crate::settings::get_data_dir;

pub(crate) const MONTH_NAMES: &[&str] = &[
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Normalize a month argument (full name, case-insensitive, or 1-12) into
/// the canonical full month name.
pub(crate) fn parse_month(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<usize>() {
        if (1..=12).contains(&n) {
            return Ok(MONTH_NAMES[n - 1].to_string());
        }
        return Err(FeesumError::UnknownMonth(raw.to_string()));
    }
    MONTH_NAMES
        .iter()
        .find(|m| m.eq_ignore_ascii_case(raw))
        .map(|m| m.to_string())
        .ok_or_else(|| FeesumError::UnknownMonth(raw.to_string()))
}

/// `--data-dir` overrides the configured directory; otherwise whatever
/// `feesum init` persisted (default: ./data).
pub(crate) fn resolve_data_dir(flag: Option<&str>) -> PathBuf {
    match flag {
        Some(dir) => PathBuf::from(dir),
        None => get_data_dir(),
    }
}

#[derive(Parser)]
#[command(name = "feesum", about = "Income summary generator for school fee collections.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up feesum: choose the directory holding the Zoho Books exports.
    Init {
        /// Path to the data directory (expects an input/ subdirectory)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Load the three exports and report record counts.
    Check {
        /// Data directory (default: configured via `feesum init`)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Generate the income summary and save it as CSV.
    Summary {
        /// Month filter: full name (e.g. March) or 1-12
        #[arg(long)]
        month: Option<String>,
        /// Year filter: YYYY
        #[arg(long)]
        year: Option<i32>,
        /// Keep only rows for this school (exact name)
        #[arg(long)]
        school: Option<String>,
        /// Output CSV path (default: <data-dir>/output/income_summary_<timestamp>.csv)
        #[arg(long)]
        output: Option<String>,
        /// Print the table without writing a CSV file
        #[arg(long = "no-write")]
        no_write: bool,
        /// Data directory (default: configured via `feesum init`)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_by_name() {
        assert_eq!(parse_month("March").unwrap(), "March");
        assert_eq!(parse_month("march").unwrap(), "March");
        assert_eq!(parse_month("DECEMBER").unwrap(), "December");
    }

    #[test]
    fn test_parse_month_by_number() {
        assert_eq!(parse_month("1").unwrap(), "January");
        assert_eq!(parse_month("12").unwrap(), "December");
    }

    #[test]
    fn test_parse_month_rejects_invalid() {
        assert!(parse_month("13").is_err());
        assert!(parse_month("0").is_err());
        assert!(parse_month("Smarch").is_err());
    }

    #[test]
    fn test_resolve_data_dir_flag_wins() {
        let dir = resolve_data_dir(Some("/tmp/exports"));
        assert_eq!(dir, PathBuf::from("/tmp/exports"));
    }
}

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::{FeesumError, Result};
use crate::models::{Contact, InvoiceItem, Payment, Tables};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a monetary field. Non-numeric values coerce to 0.0 rather than
/// failing the run; exports sometimes carry commas, quotes, a currency
/// symbol, or parenthesized negatives.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw
        .replace(',', "")
        .replace('"', "")
        .replace('\u{20b9}', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

/// Parse a date field in the formats the billing platform emits. A trailing
/// time component is tolerated. Parse failure yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw
        .split_once('T')
        .map(|(d, _)| d)
        .unwrap_or(raw)
        .split_whitespace()
        .next()?;
    // Day-first before month-first: the exports are Indian-locale.
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(d);
        }
    }
    None
}

fn read_bom_tolerant(path: &Path) -> Result<Vec<u8>> {
    let mut data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FeesumError::MissingFile(path.display().to_string())
        } else {
            FeesumError::Io(e)
        }
    })?;
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        data.drain(..3);
    }
    Ok(data)
}

fn reader_for(path: &Path) -> Result<csv::Reader<std::io::Cursor<Vec<u8>>>> {
    let data = read_bom_tolerant(path)?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::Cursor::new(data)))
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn require_column(headers: &StringRecord, name: &str, file: &Path) -> Result<usize> {
    column_index(headers, name).ok_or_else(|| FeesumError::MissingColumn {
        file: file.display().to_string(),
        column: name.to_string(),
    })
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

fn field_opt<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.map(|i| field(record, i)).unwrap_or("")
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Per-table loaders
// ---------------------------------------------------------------------------

/// Load the student contacts export. `Contact ID` is required; `School`
/// falls back to `Location Name`, then to "Unknown".
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>> {
    let mut rdr = reader_for(path)?;
    let headers = rdr.headers()?.clone();

    let idx_id = require_column(&headers, "Contact ID", path)?;
    let idx_name = column_index(&headers, "Display Name");
    let idx_school = column_index(&headers, "School")
        .or_else(|| column_index(&headers, "Location Name"));
    let idx_grade = column_index(&headers, "Grade");
    let idx_section = column_index(&headers, "Section");

    let mut contacts = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable row in {}: {e}", path.display());
                continue;
            }
        };
        let contact_id = field(&record, idx_id).to_string();
        if contact_id.is_empty() {
            continue;
        }
        contacts.push(Contact {
            contact_id,
            display_name: field_opt(&record, idx_name).to_string(),
            school: or_default(field_opt(&record, idx_school), "Unknown"),
            grade: or_default(field_opt(&record, idx_grade), "Unknown"),
            section: or_default(field_opt(&record, idx_section), "-"),
        });
    }
    log::info!("Loaded {} student contacts from {}", contacts.len(), path.display());
    Ok(contacts)
}

/// Load the invoice export, one row per line item.
pub fn load_invoice_items(path: &Path) -> Result<Vec<InvoiceItem>> {
    let mut rdr = reader_for(path)?;
    let headers = rdr.headers()?.clone();

    let idx_invoice = require_column(&headers, "Invoice Number", path)?;
    let idx_customer = require_column(&headers, "Customer ID", path)?;
    let idx_item = column_index(&headers, "Item Name");
    let idx_total = require_column(&headers, "Item Total", path)?;

    let mut items = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable row in {}: {e}", path.display());
                continue;
            }
        };
        let invoice_number = field(&record, idx_invoice).to_string();
        if invoice_number.is_empty() {
            continue;
        }
        items.push(InvoiceItem {
            invoice_number,
            customer_id: field(&record, idx_customer).to_string(),
            item_name: field_opt(&record, idx_item).to_string(),
            item_total: parse_amount(field(&record, idx_total)),
        });
    }
    log::info!("Loaded {} invoice line items from {}", items.len(), path.display());
    Ok(items)
}

/// Load the payments export. Exact duplicate rows are dropped; the first
/// occurrence wins. The fingerprint covers every column of the raw row, so
/// two legitimate payments that differ only in a column the summary never
/// reads (e.g. a payment number) are both kept.
pub fn load_payments(path: &Path) -> Result<Vec<Payment>> {
    let mut rdr = reader_for(path)?;
    let headers = rdr.headers()?.clone();

    let idx_invoice = require_column(&headers, "Invoice Number", path)?;
    let idx_customer = require_column(&headers, "CustomerID", path)?;
    let idx_date = require_column(&headers, "Date", path)?;
    let idx_amount = require_column(&headers, "Amount", path)?;

    let mut payments = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = 0usize;

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable row in {}: {e}", path.display());
                continue;
            }
        };
        let invoice_number = field(&record, idx_invoice).to_string();
        if invoice_number.is_empty() {
            continue;
        }

        let fingerprint = record.iter().collect::<Vec<&str>>().join("\u{1f}");
        if !seen.insert(fingerprint) {
            duplicates += 1;
            continue;
        }
        payments.push(Payment {
            invoice_number,
            customer_id: field(&record, idx_customer).to_string(),
            date: parse_date(field(&record, idx_date)),
            amount: parse_amount(field(&record, idx_amount)),
        });
    }
    if duplicates > 0 {
        log::info!("Dropped {duplicates} duplicate payment rows");
    }
    log::info!("Loaded {} payment records from {}", payments.len(), path.display());
    Ok(payments)
}

// ---------------------------------------------------------------------------
// load_tables
// ---------------------------------------------------------------------------

pub const CONTACTS_FILE: &str = "student_contacts.csv";
pub const INVOICES_FILE: &str = "student_invoices.csv";
pub const PAYMENTS_FILE: &str = "student_payment.csv";

/// Load all three exports from `<data_dir>/input/`. Any structural failure
/// (file absent, required column missing) aborts the run.
pub fn load_tables(data_dir: &Path) -> Result<Tables> {
    let input = data_dir.join("input");
    Ok(Tables {
        contacts: load_contacts(&input.join(CONTACTS_FILE))?,
        invoice_items: load_invoice_items(&input.join(INVOICES_FILE))?,
        payments: load_payments(&input.join(PAYMENTS_FILE))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("\"500.00\""), 500.0);
        assert_eq!(parse_amount("  -42.50  "), -42.5);
        assert_eq!(parse_amount("\u{20b9}1,000.00"), 1000.0);
        assert_eq!(parse_amount("(500.00)"), -500.0);
        assert_eq!(parse_amount("not_a_number"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(parse_date("2025-03-15"), Some(expected));
        assert_eq!(parse_date("15/03/2025"), Some(expected));
        assert_eq!(parse_date("15-03-2025"), Some(expected));
        assert_eq!(parse_date("2025-03-15 10:30:00"), Some(expected));
        assert_eq!(parse_date("2025-03-15T10:30:00"), Some(expected));
        assert_eq!(parse_date("garbage"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_date_day_first_precedence() {
        // 03/04/2025 reads as 3 April, not March 4
        assert_eq!(
            parse_date("03/04/2025"),
            Some(NaiveDate::from_ymd_opt(2025, 4, 3).unwrap())
        );
    }

    #[test]
    fn test_load_contacts_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let content = "\u{feff}Contact ID,Display Name,School,Grade,Section\n\
                       C001,Asha Rao,School X,5,A\n";
        let path = write_csv(dir.path(), "contacts.csv", content);
        let contacts = load_contacts(&path).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].contact_id, "C001");
        assert_eq!(contacts[0].school, "School X");
    }

    #[test]
    fn test_load_contacts_location_name_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Contact ID,Display Name,Location Name,Grade,Section\n\
                       C001,Asha Rao,North Campus,5,A\n";
        let path = write_csv(dir.path(), "contacts.csv", content);
        let contacts = load_contacts(&path).unwrap();
        assert_eq!(contacts[0].school, "North Campus");
    }

    #[test]
    fn test_load_contacts_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Contact ID,Display Name\nC001,Asha Rao\n";
        let path = write_csv(dir.path(), "contacts.csv", content);
        let contacts = load_contacts(&path).unwrap();
        assert_eq!(contacts[0].school, "Unknown");
        assert_eq!(contacts[0].grade, "Unknown");
        assert_eq!(contacts[0].section, "-");
    }

    #[test]
    fn test_load_contacts_missing_required_column() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Display Name,School\nAsha Rao,School X\n";
        let path = write_csv(dir.path(), "contacts.csv", content);
        let err = load_contacts(&path).unwrap_err();
        assert!(err.to_string().contains("Contact ID"), "got: {err}");
    }

    #[test]
    fn test_load_contacts_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_contacts(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, FeesumError::MissingFile(_)));
    }

    #[test]
    fn test_load_invoice_items_coerces_bad_totals() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Invoice Number,Customer ID,Item Name,Item Total\n\
                       INV-1,C001,Initial Academic Fee,\"6,000.00\"\n\
                       INV-1,C001,Term 1 Fee,bogus\n";
        let path = write_csv(dir.path(), "invoices.csv", content);
        let items = load_invoice_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_total, 6000.0);
        assert_eq!(items[1].item_total, 0.0);
    }

    #[test]
    fn test_load_payments_dedups_exact_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Invoice Number,CustomerID,Date,Amount\n\
                       INV-1,C001,2025-03-15,1000.00\n\
                       INV-1,C001,2025-03-15,1000.00\n\
                       INV-1,C001,2025-03-15,500.00\n";
        let path = write_csv(dir.path(), "payments.csv", content);
        let payments = load_payments(&path).unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].amount, 1000.0);
        assert_eq!(payments[1].amount, 500.0);
    }

    #[test]
    fn test_load_payments_keeps_distinct_rows_differing_in_extra_columns() {
        // Only the full raw row counts as a duplicate: two payments that
        // agree on every column the summary reads but carry different
        // payment numbers are both real money.
        let dir = tempfile::tempdir().unwrap();
        let content = "Payment Number,Invoice Number,CustomerID,Date,Amount\n\
                       PMT-001,INV-1,C001,2025-03-15,1000.00\n\
                       PMT-002,INV-1,C001,2025-03-15,1000.00\n";
        let path = write_csv(dir.path(), "payments.csv", content);
        let payments = load_payments(&path).unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].amount + payments[1].amount, 2000.0);
    }

    #[test]
    fn test_load_payments_skips_unreadable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payments.csv");
        let mut bytes = b"Invoice Number,CustomerID,Date,Amount\n".to_vec();
        bytes.extend_from_slice(b"INV-1,C001,2025-03-15,1000.00\n");
        // Invalid UTF-8 in the middle row
        bytes.extend_from_slice(b"INV-2,C0\xff01,2025-03-16,500.00\n");
        bytes.extend_from_slice(b"INV-3,C003,2025-03-17,250.00\n");
        std::fs::write(&path, &bytes).unwrap();
        let payments = load_payments(&path).unwrap();
        let invoices: Vec<&str> = payments
            .iter()
            .map(|p| p.invoice_number.as_str())
            .collect();
        assert_eq!(invoices, vec!["INV-1", "INV-3"]);
    }

    #[test]
    fn test_load_payments_keeps_opaque_ids() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Invoice Number,CustomerID,Date,Amount\n\
                       INV-007,007,2025-03-15,1000.00\n";
        let path = write_csv(dir.path(), "payments.csv", content);
        let payments = load_payments(&path).unwrap();
        // Leading zeros survive: IDs are strings, never numeric
        assert_eq!(payments[0].customer_id, "007");
    }

    #[test]
    fn test_load_payments_malformed_date_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Invoice Number,CustomerID,Date,Amount\n\
                       INV-1,C001,sometime last week,1000.00\n";
        let path = write_csv(dir.path(), "payments.csv", content);
        let payments = load_payments(&path).unwrap();
        assert_eq!(payments.len(), 1);
        assert!(payments[0].date.is_none());
    }

    #[test]
    fn test_load_tables_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        write_csv(&input, CONTACTS_FILE, "Contact ID,Display Name,School,Grade,Section\nC001,Asha,School X,5,A\n");
        write_csv(&input, INVOICES_FILE, "Invoice Number,Customer ID,Item Name,Item Total\nINV-1,C001,Term 1 Fee,4000\n");
        write_csv(&input, PAYMENTS_FILE, "Invoice Number,CustomerID,Date,Amount\nINV-1,C001,2025-03-15,4000\n");
        let tables = load_tables(dir.path()).unwrap();
        assert_eq!(tables.contacts.len(), 1);
        assert_eq!(tables.invoice_items.len(), 1);
        assert_eq!(tables.payments.len(), 1);
    }
}

use std::collections::HashMap;

use chrono::Datelike;

use crate::models::{Contact, FeeCategory, SummaryRow, Tables};

/// Sentinel invoice number marking a payment that settles a pre-existing
/// balance rather than an invoice.
pub const OPENING_BALANCE_MARKER: &str = "Customer opening balance";

/// Ordered classification rules, case-insensitive substring match. The
/// initial-fee rule is checked first so an item name containing both
/// "initial academic fee" and "term" stays an Initial Fee.
const FEE_RULES: &[(&str, FeeCategory)] = &[
    ("initial academic fee", FeeCategory::InitialFee),
    ("term", FeeCategory::TermMonthly),
    ("monthly fee", FeeCategory::TermMonthly),
];

/// Classify an invoice line item into a fee category. Returns `None` for
/// item names matching no rule; those items receive no allocation.
pub fn classify_fee(item_name: &str) -> Option<FeeCategory> {
    let lower = item_name.to_lowercase();
    FEE_RULES
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, category)| *category)
}

/// Month/year filters for one summary run. `None` means no filter.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    /// Full English month name, e.g. "March".
    pub month: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    grade: String,
    section: String,
    school: String,
    month: String,
}

impl Key {
    fn for_contact(contact: &Contact, month: &str) -> Self {
        Self {
            grade: contact.grade.clone(),
            section: contact.section.clone(),
            school: contact.school.clone(),
            month: month.to_string(),
        }
    }

    /// Placeholder key for opening-balance payments with no matching contact.
    fn unknown(month: &str) -> Self {
        Self {
            grade: "Unknown".to_string(),
            section: "-".to_string(),
            school: "Unknown".to_string(),
            month: month.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    opening_balance: f64,
    initial_fee: f64,
    term_monthly_fee: f64,
}

fn month_name(date: Option<chrono::NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%B").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Round to 2 decimals, half-to-even on exact halves, so totals match the
/// spreadsheets the accounting staff already have.
fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    let down = scaled.floor();
    let rounded = if scaled - down == 0.5 {
        if (down as i64) % 2 == 0 {
            down
        } else {
            down + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / 100.0
}

/// Generate the pivoted income summary: amounts collected per
/// (Grade, Section, School, Month), split into Opening Balance, Initial Fee
/// and Term/Monthly Fee.
///
/// Per-row anomalies never abort the batch. Payments referencing a missing
/// invoice or contact, and payments on zero-total invoices, are logged and
/// skipped; everything in scope is attributed to exactly one summary key and
/// contributes its full amount, minus the proportional share of line items
/// matching no fee rule.
pub fn generate_summary(tables: &Tables, filter: &SummaryFilter) -> Vec<SummaryRow> {
    log::info!(
        "Generating summary for {} {}",
        filter.month.as_deref().unwrap_or("all months"),
        filter
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "all years".to_string()),
    );

    // Lookup indices built once per run, instead of per-payment scans.
    let contact_index: HashMap<&str, &Contact> = tables
        .contacts
        .iter()
        .map(|c| (c.contact_id.as_str(), c))
        .collect();
    let mut invoice_index: HashMap<&str, Vec<&crate::models::InvoiceItem>> = HashMap::new();
    for item in &tables.invoice_items {
        invoice_index
            .entry(item.invoice_number.as_str())
            .or_default()
            .push(item);
    }

    let mut accumulators: HashMap<Key, Accumulator> = HashMap::new();

    for payment in &tables.payments {
        let month = month_name(payment.date);
        let year = payment.date.map(|d| d.year());
        if let Some(m) = &filter.month {
            if *m != month {
                continue;
            }
        }
        if let Some(y) = filter.year {
            if year != Some(y) {
                continue;
            }
        }

        if payment.invoice_number == OPENING_BALANCE_MARKER {
            // Left join: a payment with no matching contact keeps
            // Unknown/"-" placeholders rather than being dropped.
            let key = match contact_index.get(payment.customer_id.as_str()) {
                Some(contact) => Key::for_contact(contact, &month),
                None => Key::unknown(&month),
            };
            accumulators.entry(key).or_default().opening_balance += payment.amount;
            continue;
        }

        let Some(items) = invoice_index.get(payment.invoice_number.as_str()) else {
            log::warn!(
                "No invoice found for payment: {}",
                payment.invoice_number
            );
            continue;
        };
        let customer_id = items[0].customer_id.as_str();
        let Some(contact) = contact_index.get(customer_id) else {
            log::warn!("No customer found for ID: {customer_id}");
            continue;
        };

        let invoice_total: f64 = items.iter().map(|i| i.item_total).sum();
        if invoice_total == 0.0 {
            log::warn!(
                "Invoice {} has zero total, skipping payment",
                payment.invoice_number
            );
            continue;
        }

        // The payment is not earmarked for specific line items; split it
        // across every line item in proportion to its share of the total.
        let key = Key::for_contact(contact, &month);
        for item in items {
            let Some(category) = classify_fee(&item.item_name) else {
                continue;
            };
            let allocated = payment.amount * (item.item_total / invoice_total);
            let entry = accumulators.entry(key.clone()).or_default();
            match category {
                FeeCategory::InitialFee => entry.initial_fee += allocated,
                FeeCategory::TermMonthly => entry.term_monthly_fee += allocated,
            }
        }
    }

    let mut rows: Vec<SummaryRow> = accumulators
        .into_iter()
        .map(|(key, acc)| SummaryRow {
            grade: key.grade,
            section: key.section,
            school: key.school,
            month: key.month,
            opening_balance: round2(acc.opening_balance),
            initial_fee: round2(acc.initial_fee),
            term_monthly_fee: round2(acc.term_monthly_fee),
        })
        .collect();

    // Lexical sort throughout, month included: "April" < "December" <
    // "January". Downstream consumers expect this ordering as-is.
    rows.sort_by(|a, b| {
        (&a.school, &a.grade, &a.section, &a.month)
            .cmp(&(&b.school, &b.grade, &b.section, &b.month))
    });

    log::info!("Generated summary with {} rows", rows.len());
    rows
}

/// Convenience alias: summary restricted to one month of one year.
pub fn generate_monthly_report(tables: &Tables, month: &str, year: i32) -> Vec<SummaryRow> {
    generate_summary(
        tables,
        &SummaryFilter {
            month: Some(month.to_string()),
            year: Some(year),
        },
    )
}

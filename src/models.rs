/// One student/customer record from the contacts export. Reference data,
/// loaded once per run.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Contact {
    pub contact_id: String,
    pub display_name: String,
    /// "Unknown" when the export carries no school for this contact.
    pub school: String,
    /// "Unknown" when absent.
    pub grade: String,
    /// "-" when absent.
    pub section: String,
}

/// One invoice line item. Multiple rows sharing an `invoice_number` form one
/// logical invoice; their `item_total` values sum to the invoice total.
#[derive(Debug, Clone)]
pub struct InvoiceItem {
    pub invoice_number: String,
    pub customer_id: String,
    pub item_name: String,
    pub item_total: f64,
}

/// One payment row. `invoice_number` is either a real invoice reference or
/// the opening-balance sentinel. A date that failed to parse is `None`.
#[derive(Debug, Clone)]
pub struct Payment {
    pub invoice_number: String,
    pub customer_id: String,
    pub date: Option<chrono::NaiveDate>,
    pub amount: f64,
}

/// The three input tables, read-only snapshots for the duration of one run.
#[derive(Debug, Clone)]
pub struct Tables {
    pub contacts: Vec<Contact>,
    pub invoice_items: Vec<InvoiceItem>,
    pub payments: Vec<Payment>,
}

/// Fee category assigned to an invoice line item by name matching. Line items
/// matching neither rule are excluded from the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeCategory {
    InitialFee,
    TermMonthly,
}

/// One output row of the pivoted income summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub grade: String,
    pub section: String,
    pub school: String,
    pub month: String,
    pub opening_balance: f64,
    pub initial_fee: f64,
    pub term_monthly_fee: f64,
}

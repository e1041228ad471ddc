//! Expense models.

use serde::Deserialize;

/// An expense as stored by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "receiptUrl", default)]
    pub receipt_url: Option<String>,
    #[serde(rename = "expenseDate")]
    pub expense_date: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

/// Payload for recording an expense, optionally with a receipt image.
///
/// Sent as a multipart form since the receipt travels alongside the fields.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: f64,
    pub note: Option<String>,
    /// ISO date (`YYYY-MM-DD`).
    pub expense_date: String,
    pub receipt: Option<ReceiptFile>,
}

/// A receipt image attached to an expense or submitted for analysis.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Fields the backend's OCR extracted from an uploaded receipt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptAnalysis {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(rename = "expenseDate", default)]
    pub expense_date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

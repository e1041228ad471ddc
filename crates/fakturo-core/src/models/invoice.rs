//! Invoice models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single line item on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(rename = "unitPrice", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(rename = "totalPrice", default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

/// Payload for creating an invoice.
#[derive(Debug, Clone, Serialize)]
pub struct NewInvoice {
    #[serde(rename = "customerName")]
    pub customer_name: String,
    #[serde(rename = "serviceDescription")]
    pub service_description: String,
    pub amount: f64,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(rename = "invoiceDate")]
    pub invoice_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<InvoiceLineItem>>,
}

/// An invoice as stored by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(rename = "customerName")]
    pub customer_name: String,
    #[serde(rename = "serviceDescription")]
    pub service_description: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(rename = "invoiceDate")]
    pub invoice_date: String,
    #[serde(rename = "downloadUrl", default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<InvoiceLineItem>>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(default)]
    pub meta: Option<HashMap<String, String>>,
}

/// PDF layout templates, gated by plan tier on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfTemplate {
    Basic,
    Advanced,
    Elite,
}

/// Result of asking the backend to render an invoice PDF.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfGenerated {
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(default)]
    pub template: String,
}

/// Fields the backend's OCR extracted from an uploaded invoice document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceAnalysis {
    #[serde(rename = "customerName", default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "totalAmount", default)]
    pub total_amount: Option<f64>,
    #[serde(rename = "invoiceDate", default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<InvoiceLineItem>>,
}
